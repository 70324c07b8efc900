use crate::db::{RegistryError, UserRegistry};
use crate::errors::AppError;
use crate::models::{
    AuditAction, BookAppointmentParams, CancelParams, ClinicConfig, RescheduleParams,
    SessionKind, SessionStatus, UserRecord, UserUpdate, VendorResponse,
};
use crate::state::AppState;

/// Which slot a successful booking advances.
///
/// With no explicit kind the first session wins while it is still
/// `not_scheduled`, then the recurring one. When both are taken nothing
/// moves.
pub fn booking_transition(user: &UserRecord, booked: Option<SessionKind>) -> Option<SessionKind> {
    slot_in_state(user, booked, SessionStatus::NotScheduled)
}

/// Which slot a successful cancellation reverts. Mirrors `booking_transition`.
pub fn cancel_transition(user: &UserRecord, cancelled: Option<SessionKind>) -> Option<SessionKind> {
    slot_in_state(user, cancelled, SessionStatus::Scheduled)
}

fn slot_in_state(
    user: &UserRecord,
    kind: Option<SessionKind>,
    wanted: SessionStatus,
) -> Option<SessionKind> {
    match kind {
        Some(kind) => (*user.status_of(kind) == wanted).then_some(kind),
        None => [SessionKind::First, SessionKind::Recurring]
            .into_iter()
            .find(|k| *user.status_of(*k) == wanted),
    }
}

/// The session kind the clinic directory assigns to the booked event type,
/// when that disagrees with the caller's explicit `session_kind`.
pub fn slug_kind_mismatch(
    clinic: &ClinicConfig,
    params: &BookAppointmentParams,
) -> Option<SessionKind> {
    let explicit = params.session_kind?;
    clinic
        .kind_for_event_type(&params.event_type_slug)
        .filter(|kind| *kind != explicit)
}

pub fn booking_update(
    user: &UserRecord,
    name: &str,
    email: &str,
    booked: Option<SessionKind>,
) -> UserUpdate {
    let mut changes = UserUpdate {
        is_new_number: Some(false),
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        ..Default::default()
    };
    if let Some(kind) = booking_transition(user, booked) {
        changes.set_status(kind, SessionStatus::Scheduled);
    }
    changes
}

/// Applies a confirmed booking to the registry in one write, creating the
/// record for a first-time caller.
pub fn record_booking(
    registry: &mut dyn UserRegistry,
    params: &BookAppointmentParams,
) -> Result<UserRecord, RegistryError> {
    registry.upsert_with(&params.phone_number, &|user| {
        booking_update(user, &params.name, &params.email, params.session_kind)
    })
}

/// Applies a confirmed cancellation. Returns `None` when the phone number is
/// not in the registry.
pub fn record_cancellation(
    registry: &mut dyn UserRegistry,
    phone: &str,
    cancelled: Option<SessionKind>,
) -> Result<Option<UserRecord>, RegistryError> {
    let Some(user) = registry.get(phone)? else {
        tracing::warn!(phone, "cancellation for unknown phone number, registry unchanged");
        return Ok(None);
    };

    let mut changes = UserUpdate::default();
    if let Some(kind) = cancel_transition(&user, cancelled) {
        changes.set_status(kind, SessionStatus::NotScheduled);
    }
    registry.update(phone, &changes).map(Some)
}

fn upstream(e: anyhow::Error) -> AppError {
    AppError::Upstream(format!("{e:#}"))
}

pub async fn book_appointment(
    state: &AppState,
    params: &BookAppointmentParams,
) -> Result<VendorResponse, AppError> {
    if let Some(slug_kind) = slug_kind_mismatch(&state.config.clinic, params) {
        tracing::warn!(
            phone = %params.phone_number,
            event_type_slug = %params.event_type_slug,
            ?slug_kind,
            session_kind = ?params.session_kind,
            "session_kind disagrees with the event type, using session_kind"
        );
    }

    let response = state
        .scheduler
        .create_booking(&params.to_booking_request())
        .await
        .map_err(upstream)?;

    if !response.is_success() {
        return Ok(response);
    }

    let user = {
        let mut registry = state.registry()?;
        record_booking(&mut **registry, params)?
    };

    tracing::info!(
        phone = %params.phone_number,
        first = user.first_session_status.as_str(),
        recurring = user.recurring_session_status.as_str(),
        "booking recorded"
    );

    state.audit.record(
        AuditAction::Booked,
        &params.phone_number,
        &format!("Booked for {}", params.start_datetime),
    );

    Ok(response)
}

pub async fn reschedule_appointment(
    state: &AppState,
    params: &RescheduleParams,
) -> Result<VendorResponse, AppError> {
    let response = state
        .scheduler
        .reschedule_booking(&params.booking_uid, &params.start_datetime)
        .await
        .map_err(upstream)?;

    if response.is_success() {
        tracing::info!(phone = %params.phone_number, booking_uid = %params.booking_uid, "booking rescheduled");
        state.audit.record(
            AuditAction::Rescheduled,
            &params.phone_number,
            &format!("Rescheduled to {}", params.start_datetime),
        );
    }

    Ok(response)
}

pub async fn cancel_appointment(
    state: &AppState,
    params: &CancelParams,
) -> Result<VendorResponse, AppError> {
    let response = state
        .scheduler
        .cancel_booking(&params.booking_uid, &params.cancellation_reason)
        .await
        .map_err(upstream)?;

    if !response.is_success() {
        return Ok(response);
    }

    {
        let mut registry = state.registry()?;
        record_cancellation(&mut **registry, &params.phone_number, params.session_kind)?;
    }

    tracing::info!(phone = %params.phone_number, booking_uid = %params.booking_uid, "booking cancelled");

    state.audit.record(
        AuditAction::Cancelled,
        &params.phone_number,
        &format!("Cancellation Reason: {}", params.cancellation_reason),
    );

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus::{Completed, NotScheduled, Scheduled};
    use std::collections::HashMap;

    /// In-memory registry for exercising the workflow without a file.
    #[derive(Default)]
    struct MemoryRegistry {
        users: HashMap<String, UserRecord>,
    }

    impl UserRegistry for MemoryRegistry {
        fn get(&self, phone: &str) -> Result<Option<UserRecord>, RegistryError> {
            Ok(self.users.get(phone).cloned())
        }

        fn lookup_or_create(&mut self, phone: &str) -> Result<UserRecord, RegistryError> {
            Ok(self
                .users
                .entry(phone.to_string())
                .or_insert_with(|| UserRecord::new_default(phone, "UTC"))
                .clone())
        }

        fn update(&mut self, phone: &str, changes: &UserUpdate) -> Result<UserRecord, RegistryError> {
            let user = self
                .users
                .get_mut(phone)
                .ok_or_else(|| RegistryError::NotFound(phone.to_string()))?;
            changes.apply(user);
            Ok(user.clone())
        }
    }

    fn user(first: SessionStatus, recurring: SessionStatus) -> UserRecord {
        let mut user = UserRecord::new_default("+10000000001", "UTC");
        user.first_session_status = first;
        user.recurring_session_status = recurring;
        user
    }

    fn params(kind: Option<SessionKind>) -> BookAppointmentParams {
        BookAppointmentParams {
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            phone_number: "+10000000001".to_string(),
            timezone: "UTC".to_string(),
            start_datetime: "2025-01-10T10:00:00Z".to_string(),
            username: "host".to_string(),
            event_type_slug: "30min".to_string(),
            session_kind: kind,
        }
    }

    #[test]
    fn test_booking_advances_first_session() {
        let u = user(NotScheduled, NotScheduled);
        assert_eq!(booking_transition(&u, None), Some(SessionKind::First));
    }

    #[test]
    fn test_booking_advances_recurring_after_first() {
        assert_eq!(
            booking_transition(&user(Scheduled, NotScheduled), None),
            Some(SessionKind::Recurring)
        );
        assert_eq!(
            booking_transition(&user(Completed, NotScheduled), None),
            Some(SessionKind::Recurring)
        );
    }

    #[test]
    fn test_booking_with_both_scheduled_changes_nothing() {
        assert_eq!(booking_transition(&user(Scheduled, Scheduled), None), None);
    }

    #[test]
    fn test_inferred_booking_attributes_to_first_slot() {
        // Without an explicit kind a recurring booking lands on the first slot
        // while that slot is still open.
        assert_eq!(
            booking_transition(&user(NotScheduled, NotScheduled), None),
            Some(SessionKind::First)
        );
        assert_eq!(
            booking_transition(&user(NotScheduled, NotScheduled), Some(SessionKind::Recurring)),
            Some(SessionKind::Recurring)
        );
    }

    #[test]
    fn test_explicit_kind_already_scheduled() {
        assert_eq!(
            booking_transition(&user(Scheduled, NotScheduled), Some(SessionKind::First)),
            None
        );
    }

    #[test]
    fn test_cancel_reverts_first_then_recurring() {
        assert_eq!(
            cancel_transition(&user(Scheduled, Scheduled), None),
            Some(SessionKind::First)
        );
        assert_eq!(
            cancel_transition(&user(Completed, Scheduled), None),
            Some(SessionKind::Recurring)
        );
        assert_eq!(cancel_transition(&user(NotScheduled, NotScheduled), None), None);
        assert_eq!(
            cancel_transition(&user(Scheduled, Scheduled), Some(SessionKind::Recurring)),
            Some(SessionKind::Recurring)
        );
    }

    fn clinic() -> ClinicConfig {
        use crate::models::{SessionDefinition, SessionType};
        ClinicConfig {
            name: "TheraWin".to_string(),
            first_session: SessionDefinition {
                session_type: SessionType::Free,
                username: "host".to_string(),
                event_type_slug: "30min".to_string(),
            },
            recurring_session: SessionDefinition {
                session_type: SessionType::Paid,
                username: "host".to_string(),
                event_type_slug: "50min".to_string(),
            },
            insurance_submission_link: "https://example.com/insurance".to_string(),
        }
    }

    #[test]
    fn test_slug_kind_mismatch() {
        let clinic = clinic();

        // "30min" is the first-session event type.
        assert_eq!(
            slug_kind_mismatch(&clinic, &params(Some(SessionKind::Recurring))),
            Some(SessionKind::First)
        );
        assert_eq!(slug_kind_mismatch(&clinic, &params(Some(SessionKind::First))), None);
        assert_eq!(slug_kind_mismatch(&clinic, &params(None)), None);

        let mut unknown = params(Some(SessionKind::Recurring));
        unknown.event_type_slug = "15min".to_string();
        assert_eq!(slug_kind_mismatch(&clinic, &unknown), None);
    }

    #[test]
    fn test_record_booking_creates_and_updates() {
        let mut registry = MemoryRegistry::default();
        let user = record_booking(&mut registry, &params(None)).unwrap();

        assert!(!user.is_new_number);
        assert_eq!(user.name, "Dana");
        assert_eq!(user.email, "dana@example.com");
        assert_eq!(user.first_session_status, Scheduled);
        assert_eq!(user.recurring_session_status, NotScheduled);
    }

    #[test]
    fn test_record_booking_overwrites_identity() {
        let mut registry = MemoryRegistry::default();
        record_booking(&mut registry, &params(None)).unwrap();

        let mut second = params(None);
        second.name = "Dana Smith".to_string();
        second.email = "dana.smith@example.com".to_string();
        let user = record_booking(&mut registry, &second).unwrap();

        assert_eq!(user.name, "Dana Smith");
        assert_eq!(user.email, "dana.smith@example.com");
        assert_eq!(user.recurring_session_status, Scheduled);
    }

    #[test]
    fn test_record_booking_failed_write_leaves_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry =
            crate::db::CsvRegistry::open(dir.path().join("gone").join("USERS.csv"), "UTC").unwrap();

        assert!(record_booking(&mut registry, &params(None)).is_err());
        assert!(registry.get("+10000000001").unwrap().is_none());
    }

    #[test]
    fn test_record_cancellation_unknown_phone() {
        let mut registry = MemoryRegistry::default();
        let result = record_cancellation(&mut registry, "+19999999999", None).unwrap();
        assert!(result.is_none());
        assert!(registry.users.is_empty());
    }

    #[test]
    fn test_record_cancellation_reverts() {
        let mut registry = MemoryRegistry::default();
        registry
            .users
            .insert("+10000000001".to_string(), user(NotScheduled, Scheduled));

        let user = record_cancellation(&mut registry, "+10000000001", None)
            .unwrap()
            .unwrap();
        assert_eq!(user.recurring_session_status, NotScheduled);
        assert_eq!(user.first_session_status, NotScheduled);
    }
}
