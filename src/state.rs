use std::sync::{Mutex, MutexGuard};

use crate::config::AppConfig;
use crate::db::UserRegistry;
use crate::errors::AppError;
use crate::services::ai::LlmProvider;
use crate::services::audit::AuditLog;
use crate::services::scheduling::SchedulingProvider;

pub struct AppState {
    /// Single writer lock over the whole registry. Never held across an await.
    pub registry: Mutex<Box<dyn UserRegistry>>,
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub scheduler: Box<dyn SchedulingProvider>,
    pub audit: AuditLog,
}

impl AppState {
    pub fn registry(&self) -> Result<MutexGuard<'_, Box<dyn UserRegistry>>, AppError> {
        self.registry
            .lock()
            .map_err(|_| AppError::Internal("user registry lock poisoned".to_string()))
    }
}
