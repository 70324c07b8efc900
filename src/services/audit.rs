use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;

use crate::models::{AuditAction, AuditEntry};

/// Append-only text log of booking actions. Never read back.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, action: AuditAction, phone: &str, details: &str) -> anyhow::Result<AuditEntry> {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            action,
            phone_number: phone.to_string(),
            details: details.to_string(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open audit log {}", self.path.display()))?;

        file.write_all(format!("{entry}\n").as_bytes())
            .context("failed to write audit entry")?;

        Ok(entry)
    }

    /// Like `append`, but a write failure is only logged. The vendor action
    /// has already happened by the time this runs.
    pub fn record(&self, action: AuditAction, phone: &str, details: &str) {
        if let Err(e) = self.append(action, phone, details) {
            tracing::error!(error = %format!("{e:#}"), action = action.as_str(), phone, "failed to write audit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit_log.txt"));

        log.append(AuditAction::Booked, "+10000000001", "Booked for 2025-01-10T10:00:00Z")
            .unwrap();
        log.append(AuditAction::Rescheduled, "+10000000001", "Rescheduled to 2025-01-11T10:00:00Z")
            .unwrap();

        let contents = fs::read_to_string(dir.path().join("audit_log.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("UTC] ACTION=BOOKED USER=+10000000001 DETAILS=Booked for 2025-01-10T10:00:00Z"));
        assert!(lines[1].contains("ACTION=RESCHEDULED"));
        assert!(lines[0].starts_with('['));
    }

    #[test]
    fn test_record_swallows_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let log = AuditLog::new(dir.path());
        assert!(log.append(AuditAction::Cancelled, "+1", "x").is_err());
        log.record(AuditAction::Cancelled, "+1", "x");
    }

    #[test]
    fn test_forged_details_append_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit_log.txt"));

        log.append(
            AuditAction::Cancelled,
            "+10000000001",
            "Cancellation Reason: x\n[2025-01-01 00:00:00 UTC] ACTION=BOOKED USER=+19999999999 DETAILS=forged",
        )
        .unwrap();

        let contents = fs::read_to_string(dir.path().join("audit_log.txt")).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(!contents.lines().any(|l| l.starts_with("[2025-01-01")));
    }
}
