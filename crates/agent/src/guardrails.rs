use billgate_core::{BillingMonth, BillingOperation, Intent, IntentKind};
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredField {
    SubscriberNo,
    Month,
    BillTotal,
}

impl RequiredField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::SubscriberNo => "subscriberNo",
            Self::Month => "month",
            Self::BillTotal => "billTotal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SubscriberNo => "subscriber number",
            Self::Month => "billing month (YYYY-MM)",
            Self::BillTotal => "bill total",
        }
    }
}

/// An operation whose required fields have all been resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum BillingAction {
    PayBill { subscriber_no: String, month: BillingMonth },
    QueryUnpaidBills { subscriber_no: String },
    QueryBillSummary { subscriber_no: String, month: BillingMonth },
    QueryBillDetailed { subscriber_no: String, month: BillingMonth },
    AddBill { subscriber_no: String, month: BillingMonth, bill_total: Decimal },
}

impl BillingAction {
    pub fn operation(&self) -> BillingOperation {
        match self {
            Self::PayBill { .. } => BillingOperation::PayBill,
            Self::QueryUnpaidBills { .. } => BillingOperation::QueryUnpaidBills,
            Self::QueryBillSummary { .. } => BillingOperation::QueryBillSummary,
            Self::QueryBillDetailed { .. } => BillingOperation::QueryBillDetailed,
            Self::AddBill { .. } => BillingOperation::AddBill,
        }
    }

    pub fn subscriber_no(&self) -> &str {
        match self {
            Self::PayBill { subscriber_no, .. }
            | Self::QueryUnpaidBills { subscriber_no }
            | Self::QueryBillSummary { subscriber_no, .. }
            | Self::QueryBillDetailed { subscriber_no, .. }
            | Self::AddBill { subscriber_no, .. } => subscriber_no,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GuardrailDecision {
    Allow(BillingAction),
    /// Conversational intent; its message is the reply.
    PassThrough,
    Clarify { missing: Vec<RequiredField>, user_message: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuardrailPolicy;

impl GuardrailPolicy {
    pub fn required_fields(kind: IntentKind) -> &'static [RequiredField] {
        use RequiredField::{BillTotal, Month, SubscriberNo};
        match kind {
            IntentKind::QueryUnpaidBills => &[SubscriberNo],
            IntentKind::PayBill | IntentKind::QueryBillSummary | IntentKind::QueryBillDetailed => {
                &[SubscriberNo, Month]
            }
            IntentKind::AddBill => &[SubscriberNo, Month, BillTotal],
            IntentKind::NeedMoreInfo | IntentKind::Unknown => &[],
        }
    }

    pub fn evaluate(&self, intent: &Intent) -> GuardrailDecision {
        if intent.kind.is_conversational() {
            return GuardrailDecision::PassThrough;
        }

        let missing: Vec<RequiredField> = Self::required_fields(intent.kind)
            .iter()
            .copied()
            .filter(|field| !is_present(intent, *field))
            .collect();

        match resolve(intent) {
            Some(action) if missing.is_empty() => GuardrailDecision::Allow(action),
            _ => {
                let user_message = intent
                    .message
                    .clone()
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| clarification_prompt(&missing));
                GuardrailDecision::Clarify { missing, user_message }
            }
        }
    }
}

fn is_present(intent: &Intent, field: RequiredField) -> bool {
    match field {
        RequiredField::SubscriberNo => intent.subscriber_no.is_some(),
        RequiredField::Month => intent.month.is_some(),
        RequiredField::BillTotal => intent.bill_total.is_some(),
    }
}

fn resolve(intent: &Intent) -> Option<BillingAction> {
    let subscriber_no = intent.subscriber_no.clone()?;
    let action = match intent.kind {
        IntentKind::QueryUnpaidBills => BillingAction::QueryUnpaidBills { subscriber_no },
        IntentKind::PayBill => {
            BillingAction::PayBill { subscriber_no, month: intent.month.clone()? }
        }
        IntentKind::QueryBillSummary => {
            BillingAction::QueryBillSummary { subscriber_no, month: intent.month.clone()? }
        }
        IntentKind::QueryBillDetailed => {
            BillingAction::QueryBillDetailed { subscriber_no, month: intent.month.clone()? }
        }
        IntentKind::AddBill => BillingAction::AddBill {
            subscriber_no,
            month: intent.month.clone()?,
            bill_total: intent.bill_total?,
        },
        IntentKind::NeedMoreInfo | IntentKind::Unknown => return None,
    };
    Some(action)
}

fn clarification_prompt(missing: &[RequiredField]) -> String {
    let labels: Vec<&str> = missing.iter().map(RequiredField::label).collect();
    match labels.as_slice() {
        [] => "Could you tell me a bit more about what you need?".to_string(),
        [only] => format!("Could you tell me your {only}?"),
        [head @ .., last] => format!("Could you tell me your {} and {last}?", head.join(", ")),
    }
}
