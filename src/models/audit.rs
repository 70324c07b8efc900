use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Booked,
    Rescheduled,
    Cancelled,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Booked => "BOOKED",
            AuditAction::Rescheduled => "RESCHEDULED",
            AuditAction::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub phone_number: String,
    pub details: String,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ACTION={} USER={} DETAILS={}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action.as_str(),
            escape_line(&self.phone_number),
            escape_line(&self.details)
        )
    }
}

/// Keeps caller-supplied text on one line: `\`, CR and LF become `\\`, `\r`
/// and `\n`.
fn escape_line(s: &str) -> Cow<'_, str> {
    if !s.contains(['\\', '\r', '\n']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
