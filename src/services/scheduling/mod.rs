pub mod cal;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{BookingRequest, LatestBooking, VendorResponse};

/// The external scheduling vendor. Each call is one HTTP round trip with no
/// retry; success is read from the vendor's own `status` field.
#[async_trait]
pub trait SchedulingProvider: Send + Sync {
    async fn create_booking(&self, request: &BookingRequest) -> anyhow::Result<VendorResponse>;

    /// Upcoming and past bookings for one attendee.
    async fn list_bookings(&self, attendee_email: &str) -> anyhow::Result<VendorResponse>;

    async fn reschedule_booking(
        &self,
        booking_uid: &str,
        start: &str,
    ) -> anyhow::Result<VendorResponse>;

    async fn cancel_booking(&self, booking_uid: &str, reason: &str)
        -> anyhow::Result<VendorResponse>;

    async fn latest_matching_booking(
        &self,
        email: &str,
        username: &str,
        event_type_slug: &str,
    ) -> anyhow::Result<LatestBooking> {
        let listing = self.list_bookings(email).await?;
        if !listing.is_success() {
            return Ok(LatestBooking::Upstream(listing));
        }

        Ok(find_matching_booking(&listing.body, email, username, event_type_slug)
            .map(LatestBooking::Found)
            .unwrap_or(LatestBooking::NotFound))
    }
}

/// First booking in vendor order hosted by `username`, of event type
/// `event_type_slug`, with `email` among its attendees.
pub fn find_matching_booking(
    listing: &Value,
    email: &str,
    username: &str,
    event_type_slug: &str,
) -> Option<Value> {
    let bookings = listing.get("data")?.as_array()?;

    bookings
        .iter()
        .find(|booking| {
            let hosted = list_contains(booking, "hosts", "username", username);
            let slug_matches = booking["eventType"]["slug"].as_str() == Some(event_type_slug);
            let attended = list_contains(booking, "attendees", "email", email);
            hosted && slug_matches && attended
        })
        .cloned()
}

fn list_contains(booking: &Value, list: &str, field: &str, expected: &str) -> bool {
    booking
        .get(list)
        .and_then(Value::as_array)
        .map(|items| items.iter().any(|item| item[field].as_str() == Some(expected)))
        .unwrap_or(false)
}
