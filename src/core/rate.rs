//! Rate observation types

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a rate pair cannot be used for calculations.
#[derive(Debug, Error, PartialEq)]
pub enum RateError {
    #[error("{field} rate must be positive, got {value}")]
    NonPositive { field: &'static str, value: Decimal },

    #[error("{metric} is out of range for buy {buy}, sell {sell}")]
    Overflow {
        metric: &'static str,
        buy: Decimal,
        sell: Decimal,
    },
}

/// A raw buy/sell pair as returned by a rate source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePair {
    pub buy: Decimal,
    pub sell: Decimal,
}

/// A single buy/sell observation.
///
/// Candidates carry no `id`; the id is assigned when the observation is
/// persisted. Equality only looks at `buy` and `sell`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateObservation {
    #[serde(default)]
    pub id: Option<u64>,
    pub buy: Decimal,
    pub sell: Decimal,
    pub observed_at: DateTime<Local>,
}

impl RateObservation {
    /// Builds an unpersisted observation from a fetched pair.
    pub fn candidate(pair: RatePair, observed_at: DateTime<Local>) -> Result<Self, RateError> {
        let observation = Self {
            id: None,
            buy: pair.buy,
            sell: pair.sell,
            observed_at,
        };
        observation.ensure_positive()?;
        Ok(observation)
    }

    /// Fails if either side of the pair is zero or negative.
    pub fn ensure_positive(&self) -> Result<(), RateError> {
        if self.buy <= Decimal::ZERO {
            return Err(RateError::NonPositive {
                field: "buy",
                value: self.buy,
            });
        }
        if self.sell <= Decimal::ZERO {
            return Err(RateError::NonPositive {
                field: "sell",
                value: self.sell,
            });
        }
        Ok(())
    }

    /// `sell - buy`
    pub fn spread(&self) -> Decimal {
        self.sell - self.buy
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

impl PartialEq for RateObservation {
    fn eq(&self, other: &Self) -> bool {
        self.buy == other.buy && self.sell == other.sell
    }
}

impl Eq for RateObservation {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 14, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_candidate_has_no_id() {
        let obs = RateObservation::candidate(
            RatePair {
                buy: dec!(41.33),
                sell: dec!(41.8305),
            },
            at(10),
        )
        .unwrap();
        assert!(!obs.is_persisted());
        assert_eq!(obs.spread(), dec!(0.5005));
    }

    #[test]
    fn test_candidate_rejects_non_positive_rates() {
        let err = RateObservation::candidate(
            RatePair {
                buy: dec!(0),
                sell: dec!(41.0),
            },
            at(10),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RateError::NonPositive {
                field: "buy",
                value: dec!(0)
            }
        );

        let err = RateObservation::candidate(
            RatePair {
                buy: dec!(41.0),
                sell: dec!(-1),
            },
            at(10),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "sell rate must be positive, got -1");
    }

    #[test]
    fn test_equality_ignores_timestamp_and_id() {
        let pair = RatePair {
            buy: dec!(40.5),
            sell: dec!(41.0),
        };
        let a = RateObservation::candidate(pair, at(10)).unwrap().with_id(1);
        let b = RateObservation::candidate(pair, at(10) - Duration::days(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_compares_decimal_values() {
        let a = RateObservation::candidate(
            RatePair {
                buy: dec!(40.50),
                sell: dec!(41.0),
            },
            at(10),
        )
        .unwrap();
        let same = RateObservation::candidate(
            RatePair {
                buy: dec!(40.5),
                sell: dec!(41.000),
            },
            at(11),
        )
        .unwrap();
        let other_buy = RateObservation::candidate(
            RatePair {
                buy: dec!(40.8),
                sell: dec!(41.0),
            },
            at(10),
        )
        .unwrap();
        let other_sell = RateObservation::candidate(
            RatePair {
                buy: dec!(40.5),
                sell: dec!(41.3),
            },
            at(10),
        )
        .unwrap();

        assert_eq!(a, same);
        assert_ne!(a, other_buy);
        assert_ne!(a, other_sell);
    }
}
