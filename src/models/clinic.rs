use serde::{Deserialize, Serialize};

use super::SessionKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Free,
    Paid,
}

impl SessionType {
    pub fn parse(s: &str) -> Self {
        match s {
            "free" => SessionType::Free,
            _ => SessionType::Paid,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionDefinition {
    pub session_type: SessionType,
    pub username: String,
    pub event_type_slug: String,
}

/// Static description of the single clinic this deployment serves.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicConfig {
    pub name: String,
    pub first_session: SessionDefinition,
    pub recurring_session: SessionDefinition,
    pub insurance_submission_link: String,
}

/// What a caller needs to address one session kind at the vendor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionVariables {
    pub session_type: SessionType,
    pub username: String,
    #[serde(rename = "eventTypeSlug")]
    pub event_type_slug: String,
}

impl ClinicConfig {
    pub fn session(&self, kind: SessionKind) -> &SessionDefinition {
        match kind {
            SessionKind::First => &self.first_session,
            SessionKind::Recurring => &self.recurring_session,
        }
    }

    pub fn variables_for(&self, kind: SessionKind) -> SessionVariables {
        let session = self.session(kind);
        SessionVariables {
            session_type: session.session_type,
            username: session.username.clone(),
            event_type_slug: session.event_type_slug.clone(),
        }
    }

    /// Maps a vendor event-type slug back to the session kind it books.
    pub fn kind_for_event_type(&self, slug: &str) -> Option<SessionKind> {
        if self.first_session.event_type_slug == slug {
            Some(SessionKind::First)
        } else if self.recurring_session.event_type_slug == slug {
            Some(SessionKind::Recurring)
        } else {
            None
        }
    }
}
