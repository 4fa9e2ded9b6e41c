use std::sync::Arc;

use billgate_core::{is_operation_error, BackendError, BillingBackend, CompoundBillView, Intent};
use serde_json::Value;
use tracing::{debug, info};

use crate::guardrails::{BillingAction, GuardrailDecision, GuardrailPolicy, RequiredField};

#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    /// NEED_MORE_INFO or UNKNOWN: nothing to execute.
    PassThrough,
    /// Required fields absent; no backend call was made.
    Clarify { missing: Vec<RequiredField>, user_message: String },
    Executed(Value),
}

impl DispatchOutcome {
    pub fn executed_payload(&self) -> Option<&Value> {
        match self {
            Self::Executed(payload) => Some(payload),
            Self::PassThrough | Self::Clarify { .. } => None,
        }
    }
}

/// Maps a validated intent onto exactly one backend operation, or two for the
/// detailed view.
pub struct OperationDispatcher {
    backend: Arc<dyn BillingBackend>,
    guardrails: GuardrailPolicy,
}

impl OperationDispatcher {
    pub fn new(backend: Arc<dyn BillingBackend>) -> Self {
        Self { backend, guardrails: GuardrailPolicy }
    }

    pub async fn dispatch(&self, intent: &Intent) -> Result<DispatchOutcome, BackendError> {
        let action = match self.guardrails.evaluate(intent) {
            GuardrailDecision::PassThrough => return Ok(DispatchOutcome::PassThrough),
            GuardrailDecision::Clarify { missing, user_message } => {
                debug!(
                    event_name = "chat.dispatch.clarify",
                    intent = %intent.kind,
                    missing = ?missing.iter().map(RequiredField::key).collect::<Vec<_>>(),
                    "required fields missing; skipping backend"
                );
                return Ok(DispatchOutcome::Clarify { missing, user_message });
            }
            GuardrailDecision::Allow(action) => action,
        };

        let payload = self.execute(&action).await?;
        info!(
            event_name = "chat.dispatch.executed",
            operation = action.operation().as_str(),
            business_error = is_operation_error(&payload),
            "billing operation executed"
        );
        Ok(DispatchOutcome::Executed(payload))
    }

    async fn execute(&self, action: &BillingAction) -> Result<Value, BackendError> {
        let backend = self.backend.as_ref();
        match action {
            BillingAction::PayBill { subscriber_no, month } => {
                backend.pay_bill(subscriber_no, month.as_str()).await
            }
            BillingAction::QueryUnpaidBills { subscriber_no } => {
                backend.query_unpaid_bills(subscriber_no).await
            }
            BillingAction::QueryBillSummary { subscriber_no, month } => {
                backend.query_bill_summary(subscriber_no, month.as_str()).await
            }
            BillingAction::QueryBillDetailed { subscriber_no, month } => {
                self.detailed_view(subscriber_no, month.as_str()).await
            }
            BillingAction::AddBill { subscriber_no, month, bill_total } => {
                backend.add_bill(subscriber_no, month.as_str(), *bill_total).await
            }
        }
    }

    /// Detailed and unpaid queries run concurrently; either hard failure fails both.
    /// Business errors on either side count as empty lists and stay visible in `details`.
    async fn detailed_view(&self, subscriber_no: &str, month: &str) -> Result<Value, BackendError> {
        let (detailed, unpaid) = tokio::try_join!(
            self.backend.query_bill_detailed(subscriber_no, month),
            self.backend.query_unpaid_bills(subscriber_no),
        )?;

        Ok(CompoundBillView::derive(month, detailed, &unpaid).into_value())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use billgate_core::{
        BackendError, BillingBackend, BillingMonth, BillingOperation, Intent, IntentKind,
    };
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tokio::sync::Barrier;

    use super::{DispatchOutcome, OperationDispatcher};
    use crate::guardrails::RequiredField;
    use crate::testing::RecordingBackend;

    fn complete(kind: IntentKind) -> Intent {
        Intent::new(kind)
            .with_subscriber("5551234567")
            .with_month(BillingMonth::parse("2024-03").expect("month"))
            .with_bill_total(Decimal::new(9900, 2))
    }

    #[tokio::test]
    async fn each_tag_calls_exactly_its_operations() {
        let cases = [
            (IntentKind::QueryUnpaidBills, vec![BillingOperation::QueryUnpaidBills]),
            (IntentKind::PayBill, vec![BillingOperation::PayBill]),
            (IntentKind::QueryBillSummary, vec![BillingOperation::QueryBillSummary]),
            (
                IntentKind::QueryBillDetailed,
                vec![BillingOperation::QueryBillDetailed, BillingOperation::QueryUnpaidBills],
            ),
            (IntentKind::AddBill, vec![BillingOperation::AddBill]),
            (IntentKind::NeedMoreInfo, vec![]),
            (IntentKind::Unknown, vec![]),
        ];

        for (kind, expected) in cases {
            let backend = Arc::new(RecordingBackend::default());
            let dispatcher = OperationDispatcher::new(backend.clone());

            dispatcher.dispatch(&complete(kind)).await.expect("dispatch");

            let mut calls = backend.operations().await;
            calls.sort_by_key(|operation| operation.as_str());
            let mut expected = expected;
            expected.sort_by_key(|operation| operation.as_str());
            assert_eq!(calls, expected, "operations for {kind}");
        }
    }

    #[tokio::test]
    async fn missing_fields_make_no_backend_call() {
        let backend = Arc::new(RecordingBackend::default());
        let dispatcher = OperationDispatcher::new(backend.clone());
        let intent = Intent::new(IntentKind::PayBill)
            .with_subscriber("5551234567")
            .with_message("Which month?");

        let outcome = dispatcher.dispatch(&intent).await.expect("dispatch");

        assert_eq!(
            outcome,
            DispatchOutcome::Clarify {
                missing: vec![RequiredField::Month],
                user_message: "Which month?".to_string(),
            }
        );
        assert!(backend.operations().await.is_empty());
    }

    #[tokio::test]
    async fn detailed_view_reconciles_paid_and_unpaid_counts() {
        let backend = Arc::new(RecordingBackend::default().with_detailed(json!({
            "results": [{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}, {"id": 5}]
        })).with_unpaid(json!({
            "unpaidBills": [
                {"month": "2024-03"}, {"month": "2024-03"},
                {"month": "2024-01"}, {"month": "2024-02"}, {"month": "2023-12"}
            ]
        })));
        let dispatcher = OperationDispatcher::new(backend);

        let outcome =
            dispatcher.dispatch(&complete(IntentKind::QueryBillDetailed)).await.expect("dispatch");
        let payload = outcome.executed_payload().expect("executed");

        assert_eq!(payload["month"], "2024-03");
        assert_eq!(payload["totalRecordCount"], 5);
        assert_eq!(payload["unpaidRecordCount"], 2);
        assert_eq!(payload["paidRecordCount"], 3);
        assert_eq!(payload["details"]["results"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn detailed_view_fails_when_either_branch_fails() {
        let backend = Arc::new(
            RecordingBackend::default()
                .failing(BillingOperation::QueryUnpaidBills, BackendError::Transport("reset".into())),
        );
        let dispatcher = OperationDispatcher::new(backend);

        let error = dispatcher
            .dispatch(&complete(IntentKind::QueryBillDetailed))
            .await
            .expect_err("compound should fail");

        assert_eq!(error, BackendError::Transport("reset".into()));
    }

    #[tokio::test]
    async fn detailed_business_error_still_yields_a_compound_view() {
        let not_found = json!({"error": "Detailed query failed", "status": 404, "details": {}});
        let backend =
            Arc::new(RecordingBackend::default().with_detailed(not_found.clone()));
        let dispatcher = OperationDispatcher::new(backend);

        let outcome =
            dispatcher.dispatch(&complete(IntentKind::QueryBillDetailed)).await.expect("dispatch");
        let payload = outcome.executed_payload().expect("executed");

        assert_eq!(payload["month"], "2024-03");
        assert_eq!(payload["totalRecordCount"], 0);
        assert_eq!(payload["unpaidRecordCount"], 0);
        assert_eq!(payload["paidRecordCount"], 0);
        assert_eq!(payload["details"], not_found);
    }

    /// Both branches wait on a two-party barrier, so a sequential dispatch would never finish.
    struct RendezvousBackend {
        barrier: Barrier,
    }

    #[async_trait]
    impl BillingBackend for RendezvousBackend {
        async fn pay_bill(&self, _: &str, _: &str) -> Result<Value, BackendError> {
            Ok(json!({}))
        }

        async fn query_unpaid_bills(&self, _: &str) -> Result<Value, BackendError> {
            self.barrier.wait().await;
            Ok(json!({"unpaidBills": []}))
        }

        async fn query_bill_summary(&self, _: &str, _: &str) -> Result<Value, BackendError> {
            Ok(json!({}))
        }

        async fn query_bill_detailed(&self, _: &str, _: &str) -> Result<Value, BackendError> {
            self.barrier.wait().await;
            Ok(json!({"results": [{"month": "2024-03"}]}))
        }

        async fn add_bill(&self, _: &str, _: &str, _: Decimal) -> Result<Value, BackendError> {
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn detailed_view_issues_both_queries_concurrently() {
        let backend = Arc::new(RendezvousBackend { barrier: Barrier::new(2) });
        let dispatcher = OperationDispatcher::new(backend);

        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            dispatcher.dispatch(&complete(IntentKind::QueryBillDetailed)),
        )
        .await
        .expect("queries should not wait on each other")
        .expect("dispatch");

        let payload = outcome.executed_payload().expect("executed");
        assert_eq!(payload["totalRecordCount"], 1);
        assert_eq!(payload["paidRecordCount"], 1);
    }
}
