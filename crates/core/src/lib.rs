//! Shared domain types for the billing chat gateway: the normalized intent,
//! the remote billing operations, the error taxonomy and layered configuration.

pub mod backend;
pub mod config;
pub mod domain;
pub mod errors;

pub use backend::BillingBackend;
pub use domain::billing::{is_operation_error, operation_error, BillingOperation, CompoundBillView};
pub use domain::intent::{BillingMonth, Intent, IntentKind};
pub use errors::{BackendError, InterfaceError};
