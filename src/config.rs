use std::env;

use crate::models::{ClinicConfig, SessionDefinition, SessionType};

#[derive(Clone, Debug, PartialEq)]
pub enum RegistryBackend {
    Csv,
    Sqlite,
}

impl RegistryBackend {
    pub fn parse(s: &str) -> Self {
        match s {
            "sqlite" => RegistryBackend::Sqlite,
            _ => RegistryBackend::Csv,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub registry_backend: RegistryBackend,
    pub registry_path: String,
    pub audit_log_path: String,
    pub default_timezone: String,
    pub scheduling_api_url: String,
    pub scheduling_api_key: String,
    pub scheduling_api_version: String,
    pub llm_provider: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub clinic: ClinicConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            registry_backend: RegistryBackend::parse(
                &env::var("REGISTRY_BACKEND").unwrap_or_default(),
            ),
            registry_path: env::var("REGISTRY_PATH").unwrap_or_else(|_| "USERS.csv".to_string()),
            audit_log_path: env::var("AUDIT_LOG_PATH")
                .unwrap_or_else(|_| "audit_log.txt".to_string()),
            default_timezone: env::var("DEFAULT_TIMEZONE")
                .unwrap_or_else(|_| "America/Los_Angeles".to_string()),
            scheduling_api_url: env::var("SCHEDULING_API_URL")
                .unwrap_or_else(|_| "https://schedule.therawin.health/api/v2".to_string()),
            scheduling_api_key: env::var("SCHEDULING_API_KEY").unwrap_or_default(),
            scheduling_api_version: env::var("SCHEDULING_API_VERSION")
                .unwrap_or_else(|_| "2024-08-13".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            clinic: clinic_from_env(),
        }
    }
}

fn clinic_from_env() -> ClinicConfig {
    ClinicConfig {
        name: env::var("CLINIC_NAME").unwrap_or_else(|_| "TheraWin".to_string()),
        first_session: SessionDefinition {
            session_type: SessionType::parse(
                &env::var("CLINIC_FIRST_SESSION_TYPE").unwrap_or_else(|_| "free".to_string()),
            ),
            username: env::var("CLINIC_FIRST_SESSION_USERNAME")
                .unwrap_or_else(|_| "aryaman19".to_string()),
            event_type_slug: env::var("CLINIC_FIRST_SESSION_EVENT_TYPE_SLUG")
                .unwrap_or_else(|_| "30min".to_string()),
        },
        recurring_session: SessionDefinition {
            session_type: SessionType::parse(
                &env::var("CLINIC_RECURRING_SESSION_TYPE").unwrap_or_else(|_| "paid".to_string()),
            ),
            username: env::var("CLINIC_RECURRING_SESSION_USERNAME")
                .unwrap_or_else(|_| "aryaman19".to_string()),
            event_type_slug: env::var("CLINIC_RECURRING_SESSION_EVENT_TYPE_SLUG")
                .unwrap_or_else(|_| "50min".to_string()),
        },
        insurance_submission_link: env::var("CLINIC_INSURANCE_LINK")
            .unwrap_or_else(|_| "https://therawin.health/insurance".to_string()),
    }
}
