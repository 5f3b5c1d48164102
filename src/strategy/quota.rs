/// Per-user generation quota over a rolling 24-hour window
///
/// The counter lives in the volatile store as "value + absolute expiry",
/// keyed by (user, period label). Every recorded usage rewrites the value
/// with a fresh full-length expiry, so a user's window extends from their
/// most recent generation rather than a calendar boundary.
use crate::{
    cache::{categories, VolatileStore},
    error::ApiResult,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct QuotaLedger {
    store: Option<Arc<dyn VolatileStore>>,
    /// Window length in seconds, re-armed on every increment
    window_secs: u64,
}

impl QuotaLedger {
    /// Create a quota ledger. `store` may be None, in which case every
    /// check passes (fail-open).
    pub fn new(store: Option<Arc<dyn VolatileStore>>, window_secs: u64) -> Self {
        Self { store, window_secs }
    }

    /// Counter key for a user in the current period
    fn counter_key(user_id: &str) -> String {
        format!("{}:{}", user_id, Self::period_label())
    }

    /// Current period label (year-month)
    pub fn period_label() -> String {
        Utc::now().format("%Y-%m").to_string()
    }

    /// Whether the user still has budget under `limit`.
    ///
    /// Fail-open: if the counter store is unreachable, the user is treated as
    /// having budget. Availability over strict enforcement; an infra outage
    /// must never block generation.
    pub async fn remaining(&self, user_id: &str, limit: u64) -> bool {
        let Some(store) = &self.store else {
            return true;
        };

        match store
            .get_counter(categories::USAGE, &Self::counter_key(user_id))
            .await
        {
            Ok(count) => {
                debug!("Quota check: user {} at {}/{}", user_id, count, limit);
                count < limit
            }
            Err(e) => {
                warn!("Quota check failed open for {}: {}", user_id, e);
                true
            }
        }
    }

    /// Current usage count; absent counter reads as zero
    pub async fn usage(&self, user_id: &str) -> u64 {
        let Some(store) = &self.store else {
            return 0;
        };

        store
            .get_counter(categories::USAGE, &Self::counter_key(user_id))
            .await
            .unwrap_or(0)
    }

    /// Record one usage and re-arm the full window. Returns the new count.
    ///
    /// The read-then-write is optimistic: two in-flight requests may both
    /// pass the check and both record, exceeding the nominal limit by the
    /// number of concurrent requests. Accepted relaxed-consistency bound.
    pub async fn record_usage(&self, user_id: &str) -> ApiResult<u64> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let key = Self::counter_key(user_id);
        let current = store.get_counter(categories::USAGE, &key).await?;
        let next = current + 1;

        store
            .set_counter(categories::USAGE, &key, next, self.window_secs)
            .await?;

        debug!("Usage recorded: user {} now at {}", user_id, next);
        Ok(next)
    }

    /// Reset the counter: delete, then immediately re-establish an explicit
    /// zero with a fresh window, so a read inside the window sees 0 rather
    /// than an ambiguous absence.
    pub async fn reset(&self, user_id: &str) -> ApiResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let key = Self::counter_key(user_id);
        store.delete(categories::USAGE, &key).await?;
        store
            .set_counter(categories::USAGE, &key, 0, self.window_secs)
            .await?;

        debug!("Usage counter reset for {}", user_id);
        Ok(())
    }
}
