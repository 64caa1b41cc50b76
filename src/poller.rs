//! Waiting for on-chain effects to become visible.

use std::{future::Future, time::Duration};

use alloy::primitives::U256;
use tracing::info;

use crate::error::{Result, SetupError};

/// Calls `observe` until `predicate` accepts its value.
///
/// An `observe` error is returned as is, without calling `on_each_miss`.
/// Each rejected observation calls `on_each_miss` with the 1-based miss count
/// and then sleeps for `interval`. There is no built-in limit; an `Err` from
/// `on_each_miss` ends the wait with that error.
pub async fn wait_until<V, O, Fut, P, M>(
    mut observe: O,
    predicate: P,
    interval: Duration,
    mut on_each_miss: M,
) -> Result<V>
where
    O: FnMut() -> Fut,
    Fut: Future<Output = Result<V>>,
    P: Fn(&V) -> bool,
    M: FnMut(u32) -> Result<()>,
{
    let mut misses = 0u32;
    loop {
        let value = observe().await?;
        if predicate(&value) {
            return Ok(value);
        }
        misses += 1;
        on_each_miss(misses)?;
        tokio::time::sleep(interval).await;
    }
}

/// `balance >= baseline + delta`, saturating instead of overflowing.
pub fn increased_by_at_least(baseline: U256, delta: U256) -> impl Fn(&U256) -> bool {
    let target = baseline.saturating_add(delta);
    move |balance| *balance >= target
}

pub fn strictly_above(baseline: U256) -> impl Fn(&U256) -> bool {
    move |balance| *balance > baseline
}

/// Polling cadence plus the user-facing progress reporting around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Misses after which the progress line gains a hint about stale chain data.
    pub slow_hint_after: u32,
    /// Hard cutoff. `None` waits forever.
    pub max_misses: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            slow_hint_after: 6,
            max_misses: None,
        }
    }
}

impl PollSettings {
    /// Miss callback for [`wait_until`] that logs progress and enforces
    /// `max_misses`.
    pub fn reporter(&self, what: &'static str) -> impl FnMut(u32) -> Result<()> {
        let settings = *self;
        move |misses| {
            if settings.max_misses.is_some_and(|max| misses >= max) {
                return Err(SetupError::PollAborted(misses));
            }
            let secs = settings.interval.as_secs();
            if misses >= settings.slow_hint_after {
                info!(
                    misses,
                    "{what} not visible yet, waiting another {secs}s (this is taking long: if the \
                     setup configuration changed, the local chain data belongs to the previous \
                     configuration and must be deleted; otherwise ignore this message)"
                );
            } else {
                info!(misses, "{what} not visible yet, waiting another {secs}s");
            }
            Ok(())
        }
    }
}
