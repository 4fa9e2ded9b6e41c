use std::future::Future;
use std::sync::Arc;

use billgate_core::BackendError;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Bearer credential with an absolute expiry instant.
#[derive(Debug)]
pub struct AuthToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(value: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Process-local token cache. The lock is held across the refresh so that
/// concurrent callers share one credential exchange; a failed exchange leaves
/// the slot untouched.
pub struct TokenCache {
    slot: Mutex<Option<AuthToken>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { slot: Mutex::new(None), ttl, clock }
    }

    pub async fn bearer<F, Fut>(&self, exchange: F) -> Result<String, BackendError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SecretString, BackendError>>,
    {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(token) = slot.as_ref().filter(|token| token.is_valid_at(now)) {
            debug!(event_name = "billing.auth.reused", "reusing cached bearer token");
            return Ok(token.value.expose_secret().to_string());
        }

        let value = exchange().await?;
        let expires_at = self.clock.now() + self.ttl;
        let bearer = value.expose_secret().to_string();
        *slot = Some(AuthToken::new(value, expires_at));

        info!(
            event_name = "billing.auth.refreshed",
            expires_at = %expires_at.to_rfc3339(),
            "bearer token refreshed"
        );
        Ok(bearer)
    }

    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.slot.lock().await.as_ref().map(AuthToken::expires_at)
    }
}

#[cfg(test)]
pub(crate) struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn starting_at(now: DateTime<Utc>) -> Self {
        Self { now: std::sync::Mutex::new(now) }
    }

    pub(crate) fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}
