pub mod csv_registry;
pub mod migrations;
pub mod sqlite_registry;

use anyhow::Context;

use crate::config::{AppConfig, RegistryBackend};
use crate::models::{UserRecord, UserUpdate};

pub use csv_registry::CsvRegistry;
pub use sqlite_registry::SqliteRegistry;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no user with phone number {0}")]
    NotFound(String),

    #[error("registry file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("registry line {line} (phone number {phone:?}) is malformed: {source}")]
    MalformedRow {
        line: u64,
        phone: String,
        source: csv::Error,
    },

    #[error("registry database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("registry io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable table of users keyed by phone number.
///
/// Implementations persist every mutation before returning. Callers hold the
/// registry behind a single lock, so `&mut self` methods never race.
pub trait UserRegistry: Send {
    fn get(&self, phone: &str) -> Result<Option<UserRecord>, RegistryError>;

    /// Returns the record for `phone`, creating and persisting the default
    /// one if none exists yet.
    fn lookup_or_create(&mut self, phone: &str) -> Result<UserRecord, RegistryError>;

    fn update(&mut self, phone: &str, changes: &UserUpdate) -> Result<UserRecord, RegistryError>;

    /// Creates the record if needed, then applies the update `change` derives
    /// from it. Backends override this to persist once.
    fn upsert_with(
        &mut self,
        phone: &str,
        change: &dyn Fn(&UserRecord) -> UserUpdate,
    ) -> Result<UserRecord, RegistryError> {
        let user = self.lookup_or_create(phone)?;
        self.update(phone, &change(&user))
    }
}

pub fn open_registry(config: &AppConfig) -> anyhow::Result<Box<dyn UserRegistry>> {
    match config.registry_backend {
        RegistryBackend::Csv => {
            let registry = CsvRegistry::open(&config.registry_path, &config.default_timezone)
                .with_context(|| format!("failed to load registry {}", config.registry_path))?;
            Ok(Box::new(registry))
        }
        RegistryBackend::Sqlite => {
            let registry = SqliteRegistry::open(&config.registry_path, &config.default_timezone)
                .with_context(|| format!("failed to open registry {}", config.registry_path))?;
            Ok(Box::new(registry))
        }
    }
}
