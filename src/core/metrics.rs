//! Financial calculations over rate observations.
//!
//! All values are rounded half away from zero to two decimal places. Any
//! observation with a non-positive side is rejected before dividing.
use crate::core::rate::{RateError, RateObservation};
use rust_decimal::{Decimal, RoundingStrategy};

/// Default conversion reference amount.
pub const DEFAULT_LIMIT: Decimal = Decimal::from_parts(50_000, 0, 0, false, 0);

const COMMISSION_NOTIONAL: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn out_of_range(metric: &'static str, rate: &RateObservation) -> RateError {
    RateError::Overflow {
        metric,
        buy: rate.buy,
        sell: rate.sell,
    }
}

/// Percent spread between sell and buy.
pub fn ratio(rate: &RateObservation) -> Result<Decimal, RateError> {
    rate.ensure_positive()?;
    rate.sell
        .checked_div(rate.buy)
        .and_then(|r| r.checked_sub(Decimal::ONE))
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .map(round2)
        .ok_or_else(|| out_of_range("ratio", rate))
}

/// Spread for 1000 units of currency.
pub fn commission(rate: &RateObservation) -> Result<Decimal, RateError> {
    rate.ensure_positive()?;
    rate.spread()
        .checked_mul(COMMISSION_NOTIONAL)
        .map(round2)
        .ok_or_else(|| out_of_range("commission", rate))
}

/// Units that can be bought at the sell rate within `limit`.
pub fn max_to_buy(rate: &RateObservation, limit: Decimal) -> Result<Decimal, RateError> {
    rate.ensure_positive()?;
    limit
        .checked_div(rate.sell)
        .map(round2)
        .ok_or_else(|| out_of_range("max_to_buy", rate))
}

/// Units that have to be sold at the buy rate to reach `limit`.
pub fn sell_to_limit(rate: &RateObservation, limit: Decimal) -> Result<Decimal, RateError> {
    rate.ensure_positive()?;
    limit
        .checked_div(rate.buy)
        .map(round2)
        .ok_or_else(|| out_of_range("sell_to_limit", rate))
}

/// Difference between the two conversion paths for `limit`.
pub fn conversion_diff(rate: &RateObservation, limit: Decimal) -> Result<Decimal, RateError> {
    rate.ensure_positive()?;
    let per_buy = Decimal::ONE.checked_div(rate.buy);
    let per_sell = Decimal::ONE.checked_div(rate.sell);
    per_buy
        .zip(per_sell)
        .and_then(|(b, s)| b.checked_sub(s))
        .and_then(|d| d.checked_mul(limit))
        .map(round2)
        .ok_or_else(|| out_of_range("conversion_diff", rate))
}

/// Position of the observation with the smallest `sell - buy`.
///
/// Ties go to the later observation: the scan runs from the end and only a
/// strictly smaller spread replaces the current pick.
pub fn min_diff_index(rates: &[RateObservation]) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for (index, rate) in rates.iter().enumerate().rev() {
        let spread = rate.spread();
        if best.is_none_or(|(_, min)| spread < min) {
            best = Some((index, spread));
        }
    }
    best.map(|(index, _)| index)
}

/// The observation with the smallest spread, see [`min_diff_index`].
pub fn min_diff(rates: &[RateObservation]) -> Option<&RateObservation> {
    min_diff_index(rates).map(|index| &rates[index])
}

/// Minimum buy rate floored to a multiple of `increment`. Zero for no rates.
pub fn min_value_in_increments(rates: &[RateObservation], increment: Decimal) -> Decimal {
    match rates.iter().map(|rate| rate.buy).min() {
        Some(min) if !increment.is_zero() => min
            .checked_div(increment)
            .and_then(|steps| steps.floor().checked_mul(increment))
            .unwrap_or(min),
        Some(min) => min,
        None => Decimal::ZERO,
    }
}

/// All per-observation figures used in reports.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub ratio: Decimal,
    pub commission: Decimal,
    pub max_to_buy: Decimal,
    pub sell_to_limit: Decimal,
    pub conversion_diff: Decimal,
}

impl MetricsSummary {
    pub fn compute(rate: &RateObservation, limit: Decimal) -> Result<Self, RateError> {
        Ok(Self {
            ratio: ratio(rate)?,
            commission: commission(rate)?,
            max_to_buy: max_to_buy(rate, limit)?,
            sell_to_limit: sell_to_limit(rate, limit)?,
            conversion_diff: conversion_diff(rate, limit)?,
        })
    }
}
