//! Authenticated client for the remote bill-payment API.
//!
//! `BillingClient` implements [`billgate_core::BillingBackend`] over HTTP and
//! owns the cached bearer token used by every authenticated operation.

pub mod client;
pub mod token;

pub use client::BillingClient;
pub use token::{AuthToken, Clock, SystemClock, TokenCache};
