use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SessionKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attendee {
    pub name: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

/// Body of a create-booking call at the scheduling vendor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub username: String,
    #[serde(rename = "eventTypeSlug")]
    pub event_type_slug: String,
    pub start: String,
    pub attendee: Attendee,
}

/// Query parameters of `POST /book_appointment`.
#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentParams {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub timezone: String,
    pub start_datetime: String,
    pub username: String,
    #[serde(rename = "eventTypeSlug")]
    pub event_type_slug: String,
    pub session_kind: Option<SessionKind>,
}

impl BookAppointmentParams {
    pub fn to_booking_request(&self) -> BookingRequest {
        BookingRequest {
            username: self.username.clone(),
            event_type_slug: self.event_type_slug.clone(),
            start: self.start_datetime.clone(),
            attendee: Attendee {
                name: self.name.clone(),
                email: self.email.clone(),
                phone_number: self.phone_number.clone(),
                time_zone: self.timezone.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleParams {
    pub phone_number: String,
    pub booking_uid: String,
    pub start_datetime: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelParams {
    pub phone_number: String,
    pub booking_uid: String,
    pub cancellation_reason: String,
    pub session_kind: Option<SessionKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestSessionQuery {
    pub email: String,
    pub username: String,
    #[serde(rename = "eventTypeSlug")]
    pub event_type_slug: String,
}

/// Local reading of the vendor's `status` field.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorStatus {
    Success,
    Error,
    Unknown(String),
}

impl VendorStatus {
    pub fn from_body(body: &Value) -> Self {
        match body.get("status").and_then(Value::as_str) {
            Some("success") => VendorStatus::Success,
            Some("error") => VendorStatus::Error,
            Some(other) => VendorStatus::Unknown(other.to_string()),
            None => VendorStatus::Unknown(String::new()),
        }
    }
}

/// A parsed vendor reply. The raw body is kept so it can be handed back to
/// the caller untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorResponse {
    pub status: VendorStatus,
    pub body: Value,
}

impl VendorResponse {
    pub fn new(body: Value) -> Self {
        Self {
            status: VendorStatus::from_body(&body),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == VendorStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LatestBooking {
    Found(Value),
    NotFound,
    /// The listing call itself did not succeed.
    Upstream(VendorResponse),
}

impl LatestBooking {
    pub fn into_body(self) -> Value {
        match self {
            LatestBooking::Found(booking) => booking,
            LatestBooking::NotFound => serde_json::json!({
                "status": "not_found",
                "message": "No matching booking found",
            }),
            LatestBooking::Upstream(resp) => resp.body,
        }
    }
}
