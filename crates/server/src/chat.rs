use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use billgate_agent::{AgentRuntime, PipelineError};
use billgate_core::InterfaceError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

impl ChatState {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatResponse {
    pub user: String,
    pub agent: String,
    pub details: Value,
}

/// Boundary error; the body never carries more than the user-safe message and
/// the diagnostic detail of an internal failure.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            InterfaceError::BadRequest { .. } => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": self.0.user_message() })))
                    .into_response()
            }
            InterfaceError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": self.0.user_message(), "details": self.0.detail() })),
            )
                .into_response(),
        }
    }
}

pub fn router(state: ChatState) -> Router {
    Router::new().route("/api/chat", post(chat)).with_state(state)
}

pub async fn chat(
    State(state): State<ChatState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let message = match payload {
        Ok(Json(request)) => request.message.filter(|message| !message.trim().is_empty()),
        Err(rejection) => {
            warn!(
                event_name = "chat.request.rejected",
                correlation_id = %correlation_id,
                error = %rejection,
                "chat request body could not be read"
            );
            None
        }
    };
    let Some(message) = message else {
        return Err(ApiError(InterfaceError::bad_request("message is required", correlation_id)));
    };

    info!(
        event_name = "chat.request.received",
        correlation_id = %correlation_id,
        message_chars = message.chars().count(),
        "chat request received"
    );

    match state.runtime.handle_message(&message).await {
        Ok(reply) => {
            info!(
                event_name = "chat.request.completed",
                correlation_id = %correlation_id,
                intent = %reply.intent.kind,
                "chat request completed"
            );
            Ok(Json(ChatResponse {
                user: message,
                agent: reply.agent,
                details: reply.details.unwrap_or(Value::Null),
            }))
        }
        Err(failure) => {
            error!(
                event_name = "chat.request.failed",
                correlation_id = %correlation_id,
                error = %failure,
                "chat pipeline failed"
            );
            Err(ApiError(into_interface(failure, correlation_id)))
        }
    }
}

fn into_interface(failure: PipelineError, correlation_id: String) -> InterfaceError {
    match failure {
        PipelineError::Backend(error) => error.into_interface(correlation_id),
        PipelineError::Llm(error) => InterfaceError::internal(error.to_string(), correlation_id),
    }
}
