use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use billgate_core::config::BackendConfig;
use billgate_core::{operation_error, BackendError, BillingBackend, BillingOperation};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::token::{Clock, SystemClock, TokenCache};

const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// HTTP client for the bill-payment backend. Owns the bearer token lifecycle.
pub struct BillingClient {
    http: Client,
    base_url: String,
    username: String,
    tokens: TokenCache,
}

impl BillingClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &BackendConfig, clock: Arc<dyn Clock>) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| BackendError::Transport(error.to_string()))?;
        let ttl = chrono::Duration::seconds(i64::try_from(config.token_ttl_secs).unwrap_or(3600));

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            tokens: TokenCache::new(ttl, clock),
        })
    }

    /// Returns the cached bearer token, exchanging credentials when it has expired.
    pub async fn acquire_token(&self) -> Result<String, BackendError> {
        self.tokens.bearer(|| self.login()).await
    }

    async fn login(&self) -> Result<SecretString, BackendError> {
        let response = self
            .http
            .post(self.endpoint(LOGIN_PATH))
            .json(&json!({ "username": self.username }))
            .send()
            .await
            .map_err(|error| {
                error!(event_name = "billing.auth.failed", error = %error, "login request failed");
                BackendError::Authentication(error.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(event_name = "billing.auth.failed", status = %status, "login rejected");
            return Err(BackendError::Authentication(format!("login endpoint returned {status}")));
        }

        let payload: LoginResponse = response
            .json()
            .await
            .map_err(|error| BackendError::Authentication(format!("undecodable login: {error}")))?;

        match payload.token.filter(|token| !token.trim().is_empty()) {
            Some(token) => Ok(SecretString::from(token)),
            None => {
                error!(event_name = "billing.auth.failed", "login response carried no token");
                Err(BackendError::Authentication("login response carried no token".to_string()))
            }
        }
    }

    async fn call(&self, operation: BillingOperation, body: Value) -> Result<Value, BackendError> {
        let mut request = self.http.post(self.endpoint(operation.path())).json(&body);
        if operation.requires_auth() {
            let token = self.acquire_token().await?;
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|error| {
            error!(
                event_name = "billing.operation.transport_failed",
                operation = operation.as_str(),
                error = %error,
                "billing request failed before a response arrived"
            );
            BackendError::Transport(error.to_string())
        })?;

        let status = response.status();
        let bytes =
            response.bytes().await.map_err(|error| BackendError::Transport(error.to_string()))?;

        if status.is_success() {
            debug!(
                event_name = "billing.operation.succeeded",
                operation = operation.as_str(),
                status = status.as_u16(),
                "billing operation succeeded"
            );
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&bytes)
                .map_err(|error| BackendError::Decode(format!("{}: {error}", operation.as_str())));
        }

        let details = serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        warn!(
            event_name = "billing.operation.failed",
            operation = operation.as_str(),
            status = status.as_u16(),
            "billing backend reported a failure"
        );
        Ok(failure_payload(operation, status.as_u16(), details))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn failure_payload(operation: BillingOperation, status: u16, details: Value) -> Value {
    let label = match operation {
        BillingOperation::PayBill => details
            .get("paymentStatus")
            .and_then(Value::as_str)
            .unwrap_or(operation.failure_label())
            .to_string(),
        _ => operation.failure_label().to_string(),
    };
    operation_error(&label, status, details)
}

#[async_trait]
impl BillingBackend for BillingClient {
    async fn pay_bill(&self, subscriber_no: &str, month: &str) -> Result<Value, BackendError> {
        self.call(
            BillingOperation::PayBill,
            json!({ "subscriberNo": subscriber_no, "month": month }),
        )
        .await
    }

    async fn query_unpaid_bills(&self, subscriber_no: &str) -> Result<Value, BackendError> {
        self.call(BillingOperation::QueryUnpaidBills, json!({ "subscriberNo": subscriber_no }))
            .await
    }

    async fn query_bill_summary(
        &self,
        subscriber_no: &str,
        month: &str,
    ) -> Result<Value, BackendError> {
        self.call(
            BillingOperation::QueryBillSummary,
            json!({ "subscriberNo": subscriber_no, "month": month }),
        )
        .await
    }

    async fn query_bill_detailed(
        &self,
        subscriber_no: &str,
        month: &str,
    ) -> Result<Value, BackendError> {
        self.call(
            BillingOperation::QueryBillDetailed,
            json!({ "subscriberNo": subscriber_no, "month": month }),
        )
        .await
    }

    async fn add_bill(
        &self,
        subscriber_no: &str,
        month: &str,
        bill_total: Decimal,
    ) -> Result<Value, BackendError> {
        self.call(
            BillingOperation::AddBill,
            json!({
                "subscriberNo": subscriber_no,
                "month": month,
                "billTotal": bill_total.to_f64(),
            }),
        )
        .await
    }
}
