use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::json;

use crate::models::{BookingRequest, VendorResponse};

use super::SchedulingProvider;

/// Cal.com v2 bookings API.
pub struct CalComProvider {
    base_url: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl CalComProvider {
    pub fn new(base_url: String, api_key: String, api_version: String) -> Self {
        Self {
            base_url,
            api_key,
            api_version,
            client: reqwest::Client::new(),
        }
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded,
    /// so a booking uid can never reach another endpoint.
    pub fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid scheduling API url: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("scheduling API url cannot have a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> anyhow::Result<reqwest::RequestBuilder> {
        Ok(self
            .client
            .request(method, self.endpoint(segments)?)
            .bearer_auth(&self.api_key)
            .header("cal-api-version", &self.api_version))
    }
}

async fn read_response(resp: reqwest::Response, call: &str) -> anyhow::Result<VendorResponse> {
    let status = resp.status();
    let body: serde_json::Value = resp
        .json()
        .await
        .with_context(|| format!("failed to parse scheduling API response ({call})"))?;

    let parsed = VendorResponse::new(body);
    if !parsed.is_success() {
        tracing::warn!(call, http_status = %status, vendor_status = ?parsed.status, "scheduling API call did not succeed");
    }
    Ok(parsed)
}

#[async_trait]
impl SchedulingProvider for CalComProvider {
    async fn create_booking(&self, request: &BookingRequest) -> anyhow::Result<VendorResponse> {
        let resp = self
            .request(Method::POST, &["bookings"])?
            .json(request)
            .send()
            .await
            .context("failed to call scheduling API (create booking)")?;

        read_response(resp, "create_booking").await
    }

    async fn list_bookings(&self, attendee_email: &str) -> anyhow::Result<VendorResponse> {
        let resp = self
            .request(Method::GET, &["bookings"])?
            .query(&[
                ("status", "upcoming"),
                ("status", "past"),
                ("attendeeEmail", attendee_email),
            ])
            .send()
            .await
            .context("failed to call scheduling API (list bookings)")?;

        read_response(resp, "list_bookings").await
    }

    async fn reschedule_booking(
        &self,
        booking_uid: &str,
        start: &str,
    ) -> anyhow::Result<VendorResponse> {
        let resp = self
            .request(Method::POST, &["bookings", booking_uid, "reschedule"])?
            .json(&json!({ "start": start }))
            .send()
            .await
            .context("failed to call scheduling API (reschedule booking)")?;

        read_response(resp, "reschedule_booking").await
    }

    async fn cancel_booking(
        &self,
        booking_uid: &str,
        reason: &str,
    ) -> anyhow::Result<VendorResponse> {
        let resp = self
            .request(Method::POST, &["bookings", booking_uid, "cancel"])?
            .json(&json!({ "cancellationReason": reason }))
            .send()
            .await
            .context("failed to call scheduling API (cancel booking)")?;

        read_response(resp, "cancel_booking").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> CalComProvider {
        CalComProvider::new(base_url.to_string(), "key".to_string(), "2024-08-13".to_string())
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = provider("https://cal.example.com/api/v2/")
            .endpoint(&["bookings", "bk_1", "cancel"])
            .unwrap();
        assert_eq!(url.as_str(), "https://cal.example.com/api/v2/bookings/bk_1/cancel");

        let url = provider("https://cal.example.com/api/v2")
            .endpoint(&["bookings"])
            .unwrap();
        assert_eq!(url.as_str(), "https://cal.example.com/api/v2/bookings");
    }

    #[test]
    fn test_endpoint_encodes_uid() {
        let url = provider("https://cal.example.com/api/v2")
            .endpoint(&["bookings", "victim/cancel?x=#frag", "reschedule"])
            .unwrap();
        assert_eq!(url.path(), "/api/v2/bookings/victim%2Fcancel%3Fx=%23frag/reschedule");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(provider("not a url").endpoint(&["bookings"]).is_err());
    }
}
