use std::sync::Arc;

use axum::Router;
use billgate_agent::{AgentRuntime, GeminiClient, LlmError};
use billgate_billing::BillingClient;
use billgate_core::config::{AppConfig, ConfigError};
use billgate_core::BackendError;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::{chat, health};

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("billing client could not be built: {0}")]
    Billing(#[source] BackendError),
    #[error("language model client could not be built: {0}")]
    Llm(#[source] LlmError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let backend = BillingClient::new(&config.backend).map_err(BootstrapError::Billing)?;
    let llm = GeminiClient::new(&config.llm).map_err(BootstrapError::Llm)?;
    info!(
        event_name = "system.bootstrap.clients_ready",
        correlation_id = "bootstrap",
        backend_base_url = %config.backend.base_url,
        llm_model = %config.llm.model,
        "billing and language model clients initialized"
    );

    let runtime = Arc::new(AgentRuntime::new(Arc::new(llm), Arc::new(backend)));
    Ok(Application { config, runtime })
}

impl Application {
    pub fn router(&self) -> Router {
        app_router(self.runtime.clone())
    }
}

pub fn app_router(runtime: Arc<AgentRuntime>) -> Router {
    chat::router(chat::ChatState::new(runtime))
        .merge(health::router())
        .layer(CorsLayer::permissive())
}
