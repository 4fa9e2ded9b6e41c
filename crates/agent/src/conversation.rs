//! Intent extraction: prompt the model, then parse and validate what it says.
//!
//! Model output is untrusted. [`parse_intent`] reports exactly why a response
//! was rejected; [`normalize`] maps any rejection to an `UNKNOWN` intent so the
//! pipeline always has something well-formed to act on.

use std::str::FromStr;
use std::sync::Arc;

use billgate_core::{BillingMonth, Intent, IntentKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::llm::LlmClient;

pub const UNDERSTANDING_APOLOGY: &str = "Sorry, I am having trouble understanding you right now.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("model output is not valid JSON: {0}")]
    Json(String),
    #[error("model output is not a JSON object")]
    NotAnObject,
    #[error("model output has no `intent` tag")]
    MissingIntent,
    #[error("model output has unrecognized intent `{0}`")]
    UnknownTag(String),
    #[error("model output has invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Removes a surrounding markdown code fence (with optional `json` tag).
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    let inner = inner.trim_start();
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    inner.trim()
}

pub fn parse_intent(raw: &str) -> Result<Intent, NormalizeError> {
    let body = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|error| NormalizeError::Json(error.to_string()))?;
    let object = value.as_object().ok_or(NormalizeError::NotAnObject)?;

    let tag = object.get("intent").and_then(Value::as_str).ok_or(NormalizeError::MissingIntent)?;
    let kind = IntentKind::parse(tag).ok_or_else(|| NormalizeError::UnknownTag(tag.to_string()))?;

    Ok(Intent {
        kind,
        subscriber_no: subscriber_field(object)?,
        month: month_field(object),
        bill_total: bill_total_field(object)?,
        message: text_field(object, "message"),
    })
}

pub fn normalize(raw: &str) -> Intent {
    match parse_intent(raw) {
        Ok(intent) => intent,
        Err(error) => {
            warn!(
                event_name = "chat.intent.rejected",
                error = %error,
                "model output rejected; degrading to UNKNOWN"
            );
            Intent::unknown(UNDERSTANDING_APOLOGY)
        }
    }
}

fn subscriber_field(object: &Map<String, Value>) -> Result<Option<String>, NormalizeError> {
    match object.get("subscriberNo") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(Value::Number(number)) => match number.as_u64() {
            Some(digits) => Ok(Some(digits.to_string())),
            None => Err(NormalizeError::InvalidField {
                field: "subscriberNo",
                reason: format!("expected a whole number, got {number}"),
            }),
        },
        Some(other) => Err(NormalizeError::InvalidField {
            field: "subscriberNo",
            reason: format!("expected string, got {other}"),
        }),
    }
}

/// A month that is not `YYYY-MM` counts as absent so the required-field check asks for it.
fn month_field(object: &Map<String, Value>) -> Option<BillingMonth> {
    object.get("month").and_then(Value::as_str).and_then(BillingMonth::parse)
}

fn bill_total_field(object: &Map<String, Value>) -> Result<Option<Decimal>, NormalizeError> {
    let raw = match object.get("billTotal") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => {
            return Err(NormalizeError::InvalidField {
                field: "billTotal",
                reason: format!("expected number, got {other}"),
            })
        }
    };

    let total = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| NormalizeError::InvalidField {
            field: "billTotal",
            reason: format!("`{raw}` is not a number"),
        })?;
    if total.is_sign_negative() && !total.is_zero() {
        return Err(NormalizeError::InvalidField {
            field: "billTotal",
            reason: "must not be negative".to_string(),
        });
    }
    Ok(Some(total))
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn intent_prompt(user_message: &str, today: NaiveDate) -> String {
    format!(
        r#"You are an AI assistant for a Bill Payment System.
Extract the user's intent and parameters from their message.

Intents (one per backend operation):
1. QUERY_UNPAID_BILLS: list unpaid bills. Endpoint: /bank/query-bill. Required: subscriberNo.
2. PAY_BILL: pay a specific bill. Endpoint: /web/pay-bill. Required: subscriberNo, month (YYYY-MM).
3. QUERY_BILL_SUMMARY: quick bill status, limited to 3 per day. Endpoint: /mobile/query-bill. Required: subscriberNo, month (YYYY-MM).
4. QUERY_BILL_DETAILED: detailed bill breakdown, unlimited. Endpoint: /mobile/query-bill-detailed. Required: subscriberNo, month (YYYY-MM).
5. ADD_BILL: add a new bill (admin). Endpoint: /web/admin/add-bill. Required: subscriberNo, month (YYYY-MM), billTotal (number).

Rules:
- If the user asks to "pay" or mentions a "payment" but no month is given, return NEED_MORE_INFO and ask for the month. Never fall back to QUERY_UNPAID_BILLS.
- "check bills", "list bills" or "what do I owe" means QUERY_UNPAID_BILLS.
- A "summary" or "status" of a specific month means QUERY_BILL_SUMMARY.
- "details" or a "breakdown" of a specific month means QUERY_BILL_DETAILED.
- "add bill" or "create bill" means ADD_BILL.
- If a required field for the chosen intent is missing, use NEED_MORE_INFO and say what is missing in "message".
- If the request is unrelated to bills, use UNKNOWN.

Current date: {today}

User message: "{user_message}"

Respond ONLY with JSON of this shape:
{{
  "intent": "QUERY_UNPAID_BILLS" | "PAY_BILL" | "QUERY_BILL_SUMMARY" | "QUERY_BILL_DETAILED" | "ADD_BILL" | "NEED_MORE_INFO" | "UNKNOWN",
  "subscriberNo": "string" | null,
  "month": "YYYY-MM" | null,
  "billTotal": number | null,
  "message": "string (optional, clarification or chat reply)"
}}"#,
        today = today.format("%Y-%m-%d"),
    )
}

/// Asks the model for an intent. A failed model call is treated like malformed output.
pub struct IntentExtractor {
    llm: Arc<dyn LlmClient>,
}

impl IntentExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn extract(&self, user_message: &str, today: NaiveDate) -> Intent {
        match self.llm.complete(&intent_prompt(user_message, today)).await {
            Ok(text) => normalize(&text),
            Err(error) => {
                warn!(
                    event_name = "chat.intent.model_failed",
                    error = %error,
                    "intent extraction call failed; degrading to UNKNOWN"
                );
                Intent::unknown(UNDERSTANDING_APOLOGY)
            }
        }
    }
}
