pub mod audit;
pub mod booking;
pub mod clinic;
pub mod date_range;
pub mod user;

pub use audit::{AuditAction, AuditEntry};
pub use booking::{
    Attendee, BookAppointmentParams, BookingRequest, CancelParams, LatestBooking,
    LatestSessionQuery, RescheduleParams, VendorResponse, VendorStatus,
};
pub use clinic::{ClinicConfig, SessionDefinition, SessionType, SessionVariables};
pub use date_range::{DateRange, DateRequest};
pub use user::{InsuranceStatus, SessionKind, SessionStatus, UserRecord, UserUpdate};
