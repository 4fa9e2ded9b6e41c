use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::BackendError;

/// Remote bill-payment operations.
///
/// `Ok` carries either the backend payload or a structured business error
/// (`{error, status, details}`); `Err` is reserved for transport and
/// authentication failures that abort the request.
#[async_trait]
pub trait BillingBackend: Send + Sync {
    async fn pay_bill(&self, subscriber_no: &str, month: &str) -> Result<Value, BackendError>;
    async fn query_unpaid_bills(&self, subscriber_no: &str) -> Result<Value, BackendError>;
    async fn query_bill_summary(
        &self,
        subscriber_no: &str,
        month: &str,
    ) -> Result<Value, BackendError>;
    async fn query_bill_detailed(
        &self,
        subscriber_no: &str,
        month: &str,
    ) -> Result<Value, BackendError>;
    async fn add_bill(
        &self,
        subscriber_no: &str,
        month: &str,
        bill_total: Decimal,
    ) -> Result<Value, BackendError>;
}
