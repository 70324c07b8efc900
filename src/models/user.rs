use serde::{Deserialize, Serialize};

/// One row of the user registry. Field order is the column order of the
/// registry file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    #[serde(with = "flag")]
    pub is_new_number: bool,
    pub timezone: String,
    pub first_session_status: SessionStatus,
    pub recurring_session_status: SessionStatus,
    pub recurring_session_count: u32,
    pub insurance_status: InsuranceStatus,
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

impl UserRecord {
    pub fn new_default(phone_number: &str, timezone: &str) -> Self {
        Self {
            is_new_number: false,
            timezone: timezone.to_string(),
            first_session_status: SessionStatus::NotScheduled,
            recurring_session_status: SessionStatus::NotScheduled,
            recurring_session_count: 0,
            insurance_status: InsuranceStatus::NotSubmitted,
            name: String::new(),
            email: String::new(),
            phone_number: phone_number.to_string(),
        }
    }

    pub fn status_of(&self, kind: SessionKind) -> &SessionStatus {
        match kind {
            SessionKind::First => &self.first_session_status,
            SessionKind::Recurring => &self.recurring_session_status,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    First,
    Recurring,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::First => "first",
            SessionKind::Recurring => "recurring",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotScheduled,
    Scheduled,
    /// Set by an outside collaborator once a session took place.
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotScheduled => "not_scheduled",
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_scheduled" => Some(SessionStatus::NotScheduled),
            "scheduled" => Some(SessionStatus::Scheduled),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

/// Unrecognised values are kept as-is so they survive a registry rewrite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum InsuranceStatus {
    NotSubmitted,
    Submitted,
    Verified,
    Other(String),
}

impl InsuranceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            InsuranceStatus::NotSubmitted => "not_submitted",
            InsuranceStatus::Submitted => "submitted",
            InsuranceStatus::Verified => "verified",
            InsuranceStatus::Other(s) => s,
        }
    }
}

impl From<String> for InsuranceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "not_submitted" => InsuranceStatus::NotSubmitted,
            "submitted" => InsuranceStatus::Submitted,
            "verified" => InsuranceStatus::Verified,
            _ => InsuranceStatus::Other(s),
        }
    }
}

impl From<InsuranceStatus> for String {
    fn from(status: InsuranceStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Field assignments applied by `UserRegistry::update`. `None` leaves the
/// field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub is_new_number: Option<bool>,
    pub timezone: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub first_session_status: Option<SessionStatus>,
    pub recurring_session_status: Option<SessionStatus>,
    pub recurring_session_count: Option<u32>,
    pub insurance_status: Option<InsuranceStatus>,
}

impl UserUpdate {
    pub fn set_status(&mut self, kind: SessionKind, status: SessionStatus) {
        match kind {
            SessionKind::First => self.first_session_status = Some(status),
            SessionKind::Recurring => self.recurring_session_status = Some(status),
        }
    }

    pub fn apply(&self, user: &mut UserRecord) {
        if let Some(v) = self.is_new_number {
            user.is_new_number = v;
        }
        if let Some(ref v) = self.timezone {
            user.timezone = v.clone();
        }
        if let Some(ref v) = self.name {
            user.name = v.clone();
        }
        if let Some(ref v) = self.email {
            user.email = v.clone();
        }
        if let Some(v) = self.first_session_status {
            user.first_session_status = v;
        }
        if let Some(v) = self.recurring_session_status {
            user.recurring_session_status = v;
        }
        if let Some(v) = self.recurring_session_count {
            user.recurring_session_count = v;
        }
        if let Some(ref v) = self.insurance_status {
            user.insurance_status = v.clone();
        }
    }
}

/// Booleans are stored as `TRUE` / `FALSE`.
/// `TRUE`/`FALSE` booleans as stored in the registry file.
///
/// Reading accepts any case and surrounding whitespace, so a hand-edited
/// `true` loads fine, but it is written back as `TRUE` on the next rewrite.
pub mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn as_str(value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    pub fn parse(s: &str) -> Option<bool> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRUE" => Some(true),
            "FALSE" => Some(false),
            _ => None,
        }
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(as_str(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid flag: {s}")))
    }
}
