use crate::core::history::RateHistory;
use crate::core::rate::RateObservation;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::debug;

struct Inner {
    rates: Vec<RateObservation>,
    next_id: u64,
}

/// In-memory rate history
pub struct MemoryRateHistory {
    inner: Mutex<Inner>,
    max_records: usize,
}

impl MemoryRateHistory {
    pub fn new(max_records: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                rates: Vec::new(),
                next_id: 1,
            }),
            max_records,
        }
    }
}

#[async_trait]
impl RateHistory for MemoryRateHistory {
    fn max_records(&self) -> usize {
        self.max_records
    }

    async fn insert_and_trim(&self, observation: RateObservation) -> Result<RateObservation> {
        let mut inner = self.inner.lock().await;
        let stored = observation.with_id(inner.next_id);
        inner.next_id += 1;

        // Keep the vector sorted by (observed_at, id)
        let position = inner
            .rates
            .partition_point(|r| r.observed_at <= stored.observed_at);
        inner.rates.insert(position, stored.clone());

        let excess = inner.rates.len().saturating_sub(self.max_records);
        if excess > 0 {
            inner.rates.drain(..excess);
            debug!("Evicted {} old rate(s)", excess);
        }
        debug!(id = ?stored.id, "Rate PUT");
        Ok(stored)
    }

    async fn last_known(&self) -> Result<Option<RateObservation>> {
        let inner = self.inner.lock().await;
        Ok(inner.rates.last().cloned())
    }

    async fn last_n(&self, n: usize) -> Result<Vec<RateObservation>> {
        let inner = self.inner.lock().await;
        let start = inner.rates.len().saturating_sub(n);
        Ok(inner.rates[start..].to_vec())
    }

    async fn has_observation_today(&self, today: NaiveDate) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rates
            .iter()
            .any(|r| r.observed_at.date_naive() == today))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.lock().await.rates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::RatePair;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn base() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 14, 12, 0, 0).unwrap()
    }

    fn candidate(buy: Decimal, at: DateTime<Local>) -> RateObservation {
        RateObservation::candidate(
            RatePair {
                buy,
                sell: buy + dec!(0.5),
            },
            at,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let history = MemoryRateHistory::new(10);
        let first = history
            .insert_and_trim(candidate(dec!(40.1), base()))
            .await
            .unwrap();
        let second = history
            .insert_and_trim(candidate(dec!(40.2), base() + Duration::minutes(1)))
            .await
            .unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(history.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_trims_to_max_records() {
        let history = MemoryRateHistory::new(5);
        for i in 0..10 {
            history
                .insert_and_trim(candidate(
                    Decimal::from(40 + i),
                    base() + Duration::minutes(i),
                ))
                .await
                .unwrap();
        }
        let window = history.window().await.unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].buy, dec!(45));
        assert_eq!(window[4].buy, dec!(49));
    }

    #[tokio::test]
    async fn test_last_known_and_last_n() {
        let history = MemoryRateHistory::new(10);
        assert!(history.last_known().await.unwrap().is_none());
        assert!(history.last_n(3).await.unwrap().is_empty());

        for i in 0..4 {
            history
                .insert_and_trim(candidate(
                    Decimal::from(40 + i),
                    base() + Duration::hours(i),
                ))
                .await
                .unwrap();
        }
        assert_eq!(history.last_known().await.unwrap().unwrap().buy, dec!(43));

        let last = history.last_n(2).await.unwrap();
        assert_eq!(last.len(), 2);
        assert!(last[0].observed_at < last[1].observed_at);
        assert_eq!(last[1].buy, dec!(43));
    }

    #[tokio::test]
    async fn test_has_observation_today() {
        let history = MemoryRateHistory::new(10);
        let today = base().date_naive();
        assert!(!history.has_observation_today(today).await.unwrap());

        history
            .insert_and_trim(candidate(dec!(40.0), base() - Duration::days(1)))
            .await
            .unwrap();
        assert!(!history.has_observation_today(today).await.unwrap());

        history
            .insert_and_trim(candidate(dec!(40.0), base()))
            .await
            .unwrap();
        assert!(history.has_observation_today(today).await.unwrap());
        assert!(history.has_observation_today(today).await.unwrap());
    }
}
