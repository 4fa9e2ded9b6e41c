use std::sync::Arc;

use billgate_core::Intent;
use serde_json::{json, Value};
use tracing::debug;

use crate::conversation::UNDERSTANDING_APOLOGY;
use crate::dispatch::DispatchOutcome;
use crate::llm::{LlmClient, LlmError};

pub fn executed_placeholder() -> Value {
    json!({ "status": "Action executed" })
}

pub fn synthesis_prompt(user_message: &str, result: &Value) -> String {
    let rendered = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
    format!(
        r#"You are a helpful assistant for a Bill Payment System.
User asked: "{user_message}"
System performed the action and got this result:
{rendered}

Generate a natural, friendly, concise response to the user based on this result.
- If the result contains an error with status 429 or "Daily limit exceeded", apologize and explain that the daily limit for this query has been reached.
- If the result contains any other error, explain what went wrong without inventing details.
- If it lists unpaid bills, summarize them and state the total amount owed.
- If it contains paidRecordCount and unpaidRecordCount, state both counts explicitly.
- If a payment succeeded, confirm it."#
    )
}

/// Decides whether a reply needs synthesis and produces the final text.
pub struct ResponseGate {
    llm: Arc<dyn LlmClient>,
}

impl ResponseGate {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn finalize(
        &self,
        raw_message: &str,
        intent: &Intent,
        outcome: &DispatchOutcome,
    ) -> Result<String, LlmError> {
        let result = match outcome {
            DispatchOutcome::PassThrough => {
                let reply = intent
                    .message
                    .as_deref()
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or(UNDERSTANDING_APOLOGY);
                return Ok(reply.to_string());
            }
            DispatchOutcome::Clarify { user_message, .. } => return Ok(user_message.clone()),
            DispatchOutcome::Executed(Value::Null) => executed_placeholder(),
            DispatchOutcome::Executed(payload) => payload.clone(),
        };

        debug!(event_name = "chat.reply.synthesizing", intent = %intent.kind, "synthesizing reply");
        self.llm.complete(&synthesis_prompt(raw_message, &result)).await
    }
}
