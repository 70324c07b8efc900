use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use intake::config::AppConfig;
use intake::db;
use intake::routes::build_router;
use intake::services::ai::ollama::OllamaProvider;
use intake::services::ai::openai::OpenAiProvider;
use intake::services::ai::LlmProvider;
use intake::services::audit::AuditLog;
use intake::services::scheduling::cal::CalComProvider;
use intake::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let registry = db::open_registry(&config)?;

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))
        }
        _ => {
            anyhow::ensure!(
                !config.openai_api_key.is_empty(),
                "OPENAI_API_KEY must be set when LLM_PROVIDER=openai"
            );
            tracing::info!("using OpenAI-compatible LLM provider (model: {})", config.openai_model);
            Box::new(OpenAiProvider::new(
                config.openai_base_url.clone(),
                config.openai_api_key.clone(),
                config.openai_model.clone(),
            ))
        }
    };

    if config.scheduling_api_key.is_empty() {
        tracing::warn!("SCHEDULING_API_KEY is not set, scheduling calls will be rejected");
    }
    let scheduler = CalComProvider::new(
        config.scheduling_api_url.clone(),
        config.scheduling_api_key.clone(),
        config.scheduling_api_version.clone(),
    );
    scheduler.endpoint(&["bookings"])?;

    let state = Arc::new(AppState {
        registry: Mutex::new(registry),
        audit: AuditLog::new(&config.audit_log_path),
        config: config.clone(),
        llm,
        scheduler: Box::new(scheduler),
    });

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
