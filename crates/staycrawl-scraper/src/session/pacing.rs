//! Anti-throttling delays between navigations.
//!
//! Every navigation a session performs goes through [`Pacer::wait_turn`],
//! which sleeps until a randomly drawn gap has passed since the previous
//! navigation finished, as recorded by [`Pacer::mark_done`]. The first
//! navigation of a session is not delayed.

use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub min_gap: Duration,
    pub max_gap: Duration,
    /// Fixed wait after a detail page loads.
    pub detail_settle: Duration,
    /// Fixed wait after the consent overlay is dismissed.
    pub consent_settle: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            min_gap: Duration::from_secs(3),
            max_gap: Duration::from_secs(7),
            detail_settle: Duration::from_secs(3),
            consent_settle: Duration::from_secs(1),
        }
    }
}

impl PacingPolicy {
    /// A policy with every delay set to zero, for tests and replays.
    #[must_use]
    pub fn none() -> Self {
        Self {
            min_gap: Duration::ZERO,
            max_gap: Duration::ZERO,
            detail_settle: Duration::ZERO,
            consent_settle: Duration::ZERO,
        }
    }

    /// Draws one gap uniformly from `[min_gap, max_gap]`.
    pub(crate) fn draw_gap(&self) -> Duration {
        if self.max_gap <= self.min_gap {
            return self.min_gap;
        }
        let min_ms = u64::try_from(self.min_gap.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_gap.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
    }
}

#[derive(Debug)]
pub(crate) struct Pacer {
    policy: PacingPolicy,
    last_finished: Mutex<Option<Instant>>,
}

impl Pacer {
    pub(crate) fn new(policy: PacingPolicy) -> Self {
        Self {
            policy,
            last_finished: Mutex::new(None),
        }
    }

    pub(crate) fn policy(&self) -> &PacingPolicy {
        &self.policy
    }

    /// Blocks until a fresh gap has passed since the previous navigation
    /// finished.
    pub(crate) async fn wait_turn(&self) {
        let previous = *self.last_finished.lock().await;
        if let Some(previous) = previous {
            let gap = self.policy.draw_gap();
            let elapsed = previous.elapsed();
            if elapsed < gap {
                let wait = gap - elapsed;
                tracing::debug!(wait_ms = wait.as_millis(), "pacing before navigation");
                tokio::time::sleep(wait).await;
            }
        }
    }

    /// Records that a navigation just finished, successfully or not.
    pub(crate) async fn mark_done(&self) {
        *self.last_finished.lock().await = Some(Instant::now());
    }
}
