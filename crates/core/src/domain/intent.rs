use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    QueryUnpaidBills,
    PayBill,
    QueryBillSummary,
    QueryBillDetailed,
    AddBill,
    NeedMoreInfo,
    Unknown,
}

impl IntentKind {
    pub const ALL: [IntentKind; 7] = [
        Self::QueryUnpaidBills,
        Self::PayBill,
        Self::QueryBillSummary,
        Self::QueryBillDetailed,
        Self::AddBill,
        Self::NeedMoreInfo,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryUnpaidBills => "QUERY_UNPAID_BILLS",
            Self::PayBill => "PAY_BILL",
            Self::QueryBillSummary => "QUERY_BILL_SUMMARY",
            Self::QueryBillDetailed => "QUERY_BILL_DETAILED",
            Self::AddBill => "ADD_BILL",
            Self::NeedMoreInfo => "NEED_MORE_INFO",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw.trim())
    }

    /// Conversational intents carry no backend action; their message is the reply.
    pub fn is_conversational(&self) -> bool {
        matches!(self, Self::NeedMoreInfo | Self::Unknown)
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated billing period in `YYYY-MM` form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillingMonth(String);

impl BillingMonth {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (year, month) = trimmed.split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        if !year.chars().chain(month.chars()).all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        let month_number = month.parse::<u8>().ok()?;
        (1..=12).contains(&month_number).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized output of intent extraction. The kind decides which fields matter.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    #[serde(rename = "intent")]
    pub kind: IntentKind,
    pub subscriber_no: Option<String>,
    pub month: Option<BillingMonth>,
    pub bill_total: Option<Decimal>,
    pub message: Option<String>,
}

impl Intent {
    pub fn new(kind: IntentKind) -> Self {
        Self { kind, subscriber_no: None, month: None, bill_total: None, message: None }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self { message: Some(message.into()), ..Self::new(IntentKind::Unknown) }
    }

    pub fn with_subscriber(mut self, subscriber_no: impl Into<String>) -> Self {
        self.subscriber_no = Some(subscriber_no.into());
        self
    }

    pub fn with_month(mut self, month: BillingMonth) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_bill_total(mut self, bill_total: Decimal) -> Self {
        self.bill_total = Some(bill_total);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
