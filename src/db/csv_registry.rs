use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{UserRecord, UserUpdate};

use super::{RegistryError, UserRegistry};

/// Header row, in `UserRecord` field order.
pub const COLUMNS: [&str; 9] = [
    "is_new_number",
    "timezone",
    "first_session_status",
    "recurring_session_status",
    "recurring_session_count",
    "insurance_status",
    "name",
    "email",
    "phone_number",
];

/// Registry held fully in memory and mirrored to a CSV file. Every mutation
/// rewrites the whole file.
pub struct CsvRegistry {
    path: PathBuf,
    default_timezone: String,
    users: Vec<UserRecord>,
}

impl CsvRegistry {
    pub fn open(path: impl AsRef<Path>, default_timezone: &str) -> Result<Self, RegistryError> {
        let path = path.as_ref().to_path_buf();
        let users = if path.exists() {
            load(&path)?
        } else {
            tracing::warn!(path = %path.display(), "registry file not found, starting empty");
            Vec::new()
        };

        tracing::info!(path = %path.display(), users = users.len(), "loaded user registry");

        Ok(Self {
            path,
            default_timezone: default_timezone.to_string(),
            users,
        })
    }

    fn persist(&self) -> Result<(), RegistryError> {
        let mut tmp: OsString = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp)?;
            writer.write_record(COLUMNS)?;
            for user in &self.users {
                writer.serialize(user)?;
            }
            writer.flush()?;
        }

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Reads every row. One bad row fails the whole load, since the next
/// rewrite would otherwise drop it from disk.
fn load(path: &Path) -> Result<Vec<UserRecord>, RegistryError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let phone_col = headers.iter().position(|h| h == "phone_number");

    let mut users = Vec::new();
    for record in reader.records() {
        let record = record?;
        let user = record
            .deserialize::<UserRecord>(Some(&headers))
            .map_err(|source| RegistryError::MalformedRow {
                line: record.position().map_or(0, |p| p.line()),
                phone: phone_col
                    .and_then(|i| record.get(i))
                    .unwrap_or_default()
                    .to_string(),
                source,
            })?;
        users.push(user);
    }
    Ok(users)
}

impl UserRegistry for CsvRegistry {
    fn get(&self, phone: &str) -> Result<Option<UserRecord>, RegistryError> {
        Ok(self.users.iter().find(|u| u.phone_number == phone).cloned())
    }

    fn lookup_or_create(&mut self, phone: &str) -> Result<UserRecord, RegistryError> {
        if let Some(user) = self.users.iter().find(|u| u.phone_number == phone) {
            return Ok(user.clone());
        }

        let user = UserRecord::new_default(phone, &self.default_timezone);
        self.users.push(user.clone());
        if let Err(e) = self.persist() {
            self.users.pop();
            return Err(e);
        }

        tracing::info!(phone, "created user record");
        Ok(user)
    }

    fn update(&mut self, phone: &str, changes: &UserUpdate) -> Result<UserRecord, RegistryError> {
        let idx = self
            .users
            .iter()
            .position(|u| u.phone_number == phone)
            .ok_or_else(|| RegistryError::NotFound(phone.to_string()))?;

        let previous = self.users[idx].clone();
        changes.apply(&mut self.users[idx]);
        if let Err(e) = self.persist() {
            self.users[idx] = previous;
            return Err(e);
        }

        Ok(self.users[idx].clone())
    }

    fn upsert_with(
        &mut self,
        phone: &str,
        change: &dyn Fn(&UserRecord) -> UserUpdate,
    ) -> Result<UserRecord, RegistryError> {
        let (idx, created) = match self.users.iter().position(|u| u.phone_number == phone) {
            Some(idx) => (idx, false),
            None => {
                self.users
                    .push(UserRecord::new_default(phone, &self.default_timezone));
                (self.users.len() - 1, true)
            }
        };

        let previous = self.users[idx].clone();
        change(&previous).apply(&mut self.users[idx]);
        if let Err(e) = self.persist() {
            if created {
                self.users.pop();
            } else {
                self.users[idx] = previous;
            }
            return Err(e);
        }

        if created {
            tracing::info!(phone, "created user record");
        }
        Ok(self.users[idx].clone())
    }
}
