//! Deadline-bounded access to an [`ArmyGenerator`].
//!
//! Generators are synchronous and may be slow, so each request runs on the
//! blocking pool under a timeout. Any failure, the timeout included,
//! degrades to the built-in army or report. Match setup never waits longer
//! than the deadline.

use std::sync::Arc;
use std::time::Duration;

use siege_core::army::{
    fallback_army, fallback_report, ArmyDescription, ArmyError, ArmyGenerator, BattleReport,
};
use siege_core::simulation::GameStatus;

/// A generator shared with the blocking pool.
pub type SharedGenerator = Arc<dyn ArmyGenerator + Send + Sync>;

/// Timeout wrapper around a generator.
#[derive(Clone)]
pub struct ArmyService {
    generator: SharedGenerator,
    timeout: Duration,
}

impl std::fmt::Debug for ArmyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmyService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ArmyService {
    /// Wrap `generator` with a per-request deadline.
    #[must_use]
    pub fn new(generator: SharedGenerator, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// An army for `power`, or the built-in one.
    pub async fn army(&self, power: u32) -> ArmyDescription {
        let generator = Arc::clone(&self.generator);
        let answer = self.bounded(move || generator.request_army(power)).await;
        match answer.and_then(|army| army.validate().map(|()| army)) {
            Ok(army) => army,
            Err(error) => {
                tracing::warn!(%error, power, "Army generator failed, using built-in army");
                fallback_army(power)
            }
        }
    }

    /// A report for a finished match, or the built-in one.
    pub async fn report(&self, outcome: GameStatus, power: u32) -> BattleReport {
        let generator = Arc::clone(&self.generator);
        let answer = self
            .bounded(move || generator.battle_report(outcome, power))
            .await;
        answer.unwrap_or_else(|error| {
            tracing::warn!(%error, "Report generator failed, using built-in report");
            fallback_report(outcome)
        })
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, ArmyError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ArmyError> + Send + 'static,
    {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(call)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(join_error)) => Err(ArmyError::Unavailable(join_error.to_string())),
            Err(_) => Err(ArmyError::Timeout(timeout_ms)),
        }
    }
}
