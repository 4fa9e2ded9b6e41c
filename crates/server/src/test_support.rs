//! Fakes for the server's handler and router tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use billgate_agent::{AgentRuntime, LlmClient, LlmError};
use billgate_core::{BackendError, BillingBackend};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Mutex;

pub(crate) struct QueuedLlm {
    replies: Mutex<VecDeque<String>>,
}

#[async_trait]
impl LlmClient for QueuedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.replies.lock().await.pop_front().ok_or(LlmError::EmptyCompletion)
    }
}

pub(crate) fn runtime(replies: Vec<&str>, backend: Arc<dyn BillingBackend>) -> Arc<AgentRuntime> {
    let replies = replies.into_iter().map(str::to_string).collect();
    let llm = Arc::new(QueuedLlm { replies: Mutex::new(replies) });
    Arc::new(AgentRuntime::new(llm, backend))
}

pub(crate) struct StaticBackend;

#[async_trait]
impl BillingBackend for StaticBackend {
    async fn pay_bill(&self, _: &str, _: &str) -> Result<Value, BackendError> {
        Ok(json!({ "paymentStatus": "Successful" }))
    }

    async fn query_unpaid_bills(&self, _: &str) -> Result<Value, BackendError> {
        Ok(json!({ "unpaidBills": [] }))
    }

    async fn query_bill_summary(&self, _: &str, _: &str) -> Result<Value, BackendError> {
        Ok(json!({ "billTotal": 0 }))
    }

    async fn query_bill_detailed(&self, _: &str, _: &str) -> Result<Value, BackendError> {
        Ok(json!({ "results": [] }))
    }

    async fn add_bill(&self, _: &str, _: &str, _: Decimal) -> Result<Value, BackendError> {
        Ok(json!({ "message": "Bill added" }))
    }
}

pub(crate) struct FailingBackend(pub BackendError);

#[async_trait]
impl BillingBackend for FailingBackend {
    async fn pay_bill(&self, _: &str, _: &str) -> Result<Value, BackendError> {
        Err(self.0.clone())
    }

    async fn query_unpaid_bills(&self, _: &str) -> Result<Value, BackendError> {
        Err(self.0.clone())
    }

    async fn query_bill_summary(&self, _: &str, _: &str) -> Result<Value, BackendError> {
        Err(self.0.clone())
    }

    async fn query_bill_detailed(&self, _: &str, _: &str) -> Result<Value, BackendError> {
        Err(self.0.clone())
    }

    async fn add_bill(&self, _: &str, _: &str, _: Decimal) -> Result<Value, BackendError> {
        Err(self.0.clone())
    }
}
