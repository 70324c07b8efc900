pub mod appointments;
pub mod clinic;
pub mod dates;
pub mod health;
pub mod users;
