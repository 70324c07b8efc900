pub mod ai;
pub mod audit;
pub mod scheduling;
pub mod session;
