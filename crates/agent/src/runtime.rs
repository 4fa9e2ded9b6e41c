use std::sync::Arc;

use billgate_core::{BackendError, BillingBackend, Intent};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::conversation::IntentExtractor;
use crate::dispatch::{DispatchOutcome, OperationDispatcher};
use crate::llm::{LlmClient, LlmError};
use crate::response::ResponseGate;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("reply synthesis failed: {0}")]
    Llm(#[from] LlmError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatReply {
    pub agent: String,
    pub details: Option<Value>,
    pub intent: Intent,
}

/// Normalize, dispatch, finalize. One call per inbound chat message.
pub struct AgentRuntime {
    extractor: IntentExtractor,
    dispatcher: OperationDispatcher,
    gate: ResponseGate,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, backend: Arc<dyn BillingBackend>) -> Self {
        Self {
            extractor: IntentExtractor::new(llm.clone()),
            dispatcher: OperationDispatcher::new(backend),
            gate: ResponseGate::new(llm),
        }
    }

    pub async fn handle_message(&self, message: &str) -> Result<ChatReply, PipelineError> {
        self.handle_message_on(message, Utc::now().date_naive()).await
    }

    pub async fn handle_message_on(
        &self,
        message: &str,
        today: NaiveDate,
    ) -> Result<ChatReply, PipelineError> {
        let intent = self.extractor.extract(message, today).await;
        info!(
            event_name = "chat.intent.parsed",
            intent = %intent.kind,
            has_subscriber = intent.subscriber_no.is_some(),
            has_month = intent.month.is_some(),
            "intent normalized"
        );

        let outcome = self.dispatcher.dispatch(&intent).await?;
        let agent = self.gate.finalize(message, &intent, &outcome).await?;
        let details = match outcome {
            DispatchOutcome::Executed(payload) => Some(payload),
            DispatchOutcome::PassThrough | DispatchOutcome::Clarify { .. } => None,
        };

        Ok(ChatReply { agent, details, intent })
    }
}
