//! Scripted collaborators for pipeline tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use billgate_core::{BackendError, BillingBackend, BillingOperation};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::llm::{LlmClient, LlmError};

/// Replays queued completions in order and records every prompt.
#[derive(Default)]
pub(crate) struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub(crate) fn with_replies(replies: Vec<Result<String, LlmError>>) -> Self {
        Self { replies: Mutex::new(replies.into()), prompts: Mutex::default() }
    }

    pub(crate) async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.replies.lock().await.pop_front().unwrap_or(Err(LlmError::EmptyCompletion))
    }
}

/// In-memory backend that records which operations were invoked.
pub(crate) struct RecordingBackend {
    payloads: HashMap<BillingOperation, Value>,
    failures: HashMap<BillingOperation, BackendError>,
    calls: Mutex<Vec<BillingOperation>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        let payloads = HashMap::from([
            (BillingOperation::PayBill, json!({ "paymentStatus": "Successful" })),
            (BillingOperation::QueryUnpaidBills, json!({ "unpaidBills": [] })),
            (BillingOperation::QueryBillSummary, json!({ "billTotal": 0, "paidStatus": true })),
            (BillingOperation::QueryBillDetailed, json!({ "results": [] })),
            (BillingOperation::AddBill, json!({ "message": "Bill added" })),
        ]);
        Self { payloads, failures: HashMap::new(), calls: Mutex::default() }
    }
}

impl RecordingBackend {
    pub(crate) fn with_unpaid(self, payload: Value) -> Self {
        self.responding(BillingOperation::QueryUnpaidBills, payload)
    }

    pub(crate) fn with_summary(self, payload: Value) -> Self {
        self.responding(BillingOperation::QueryBillSummary, payload)
    }

    pub(crate) fn with_detailed(self, payload: Value) -> Self {
        self.responding(BillingOperation::QueryBillDetailed, payload)
    }

    pub(crate) fn responding(mut self, operation: BillingOperation, payload: Value) -> Self {
        self.payloads.insert(operation, payload);
        self
    }

    pub(crate) fn failing(mut self, operation: BillingOperation, error: BackendError) -> Self {
        self.failures.insert(operation, error);
        self
    }

    pub(crate) async fn operations(&self) -> Vec<BillingOperation> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, operation: BillingOperation) -> Result<Value, BackendError> {
        self.calls.lock().await.push(operation);
        if let Some(error) = self.failures.get(&operation) {
            return Err(error.clone());
        }
        Ok(self.payloads.get(&operation).cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl BillingBackend for RecordingBackend {
    async fn pay_bill(&self, _subscriber_no: &str, _month: &str) -> Result<Value, BackendError> {
        self.record(BillingOperation::PayBill).await
    }

    async fn query_unpaid_bills(&self, _subscriber_no: &str) -> Result<Value, BackendError> {
        self.record(BillingOperation::QueryUnpaidBills).await
    }

    async fn query_bill_summary(
        &self,
        _subscriber_no: &str,
        _month: &str,
    ) -> Result<Value, BackendError> {
        self.record(BillingOperation::QueryBillSummary).await
    }

    async fn query_bill_detailed(
        &self,
        _subscriber_no: &str,
        _month: &str,
    ) -> Result<Value, BackendError> {
        self.record(BillingOperation::QueryBillDetailed).await
    }

    async fn add_bill(
        &self,
        _subscriber_no: &str,
        _month: &str,
        _bill_total: Decimal,
    ) -> Result<Value, BackendError> {
        self.record(BillingOperation::AddBill).await
    }
}
