//! Retention store abstraction

use crate::core::rate::RateObservation;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Bounded, chronologically ordered history of persisted observations.
///
/// Implementations assume a single writer.
#[async_trait]
pub trait RateHistory: Send + Sync {
    /// Maximum number of observations kept.
    fn max_records(&self) -> usize;

    /// Persists `observation`, assigning it an id, then evicts the oldest
    /// entries beyond [`RateHistory::max_records`].
    async fn insert_and_trim(&self, observation: RateObservation) -> Result<RateObservation>;

    /// The observation with the latest `observed_at`.
    async fn last_known(&self) -> Result<Option<RateObservation>>;

    /// Up to `n` most recent observations, oldest first.
    async fn last_n(&self, n: usize) -> Result<Vec<RateObservation>>;

    /// Whether any observation falls on `today` in local time.
    async fn has_observation_today(&self, today: NaiveDate) -> Result<bool>;

    async fn len(&self) -> Result<usize>;

    /// The full window, oldest first.
    async fn window(&self) -> Result<Vec<RateObservation>> {
        self.last_n(self.max_records()).await
    }
}
