use serde::Serialize;
use serde_json::{json, Value};

/// The five remote bill-payment operations and their fixed endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BillingOperation {
    PayBill,
    QueryUnpaidBills,
    QueryBillSummary,
    QueryBillDetailed,
    AddBill,
}

impl BillingOperation {
    pub fn path(&self) -> &'static str {
        match self {
            Self::PayBill => "/web/pay-bill",
            Self::QueryUnpaidBills => "/bank/query-bill",
            Self::QueryBillSummary => "/mobile/query-bill",
            Self::QueryBillDetailed => "/mobile/query-bill-detailed",
            Self::AddBill => "/web/admin/add-bill",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::PayBill)
    }

    /// Label attached to a backend-reported failure so synthesis can say which step failed.
    pub fn failure_label(&self) -> &'static str {
        match self {
            Self::PayBill => "Error",
            Self::QueryUnpaidBills => "Query failed",
            Self::QueryBillSummary => "Summary query failed",
            Self::QueryBillDetailed => "Detailed query failed",
            Self::AddBill => "Add bill failed",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PayBill => "pay_bill",
            Self::QueryUnpaidBills => "query_unpaid_bills",
            Self::QueryBillSummary => "query_bill_summary",
            Self::QueryBillDetailed => "query_bill_detailed",
            Self::AddBill => "add_bill",
        }
    }
}

/// Structured business error: `{error, status, details}`. Handed to synthesis as data.
pub fn operation_error(label: &str, status: u16, details: Value) -> Value {
    json!({ "error": label, "status": status, "details": details })
}

pub fn is_operation_error(value: &Value) -> bool {
    value.get("error").is_some()
}

/// Paid/unpaid view for one month, derived from the detailed and unpaid queries.
///
/// Paid and unpaid are reconciled by count only: the backend exposes no
/// per-bill identifier, so the counts are approximate when records repeat.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundBillView {
    pub month: String,
    pub total_record_count: usize,
    pub unpaid_record_count: usize,
    pub paid_record_count: usize,
    pub details: Value,
}

impl CompoundBillView {
    pub fn derive(month: &str, detailed: Value, unpaid: &Value) -> Self {
        let total_record_count = record_list(&detailed, "results").len();
        let unpaid_record_count = record_list(unpaid, "unpaidBills")
            .iter()
            .filter(|record| record.get("month").and_then(Value::as_str) == Some(month))
            .count();

        Self {
            month: month.to_string(),
            total_record_count,
            unpaid_record_count,
            paid_record_count: total_record_count.saturating_sub(unpaid_record_count),
            details: detailed,
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn record_list<'a>(payload: &'a Value, key: &str) -> &'a [Value] {
    payload.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}
