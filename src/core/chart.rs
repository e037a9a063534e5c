//! Chart data preparation.
//!
//! Turns the chronological window into plot-ready series. Rendering itself is
//! left to a [`crate::core::render::ChartRenderer`].
use crate::core::metrics::{self, min_diff_index, min_value_in_increments};
use crate::core::rate::{RateError, RateObservation};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt::Display;

const RATE_AXIS_INCREMENT: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Rates,
    Ratios,
    ConversionDiff,
}

impl ChartKind {
    /// Every chart in dispatch order.
    pub const ALL: [ChartKind; 3] = [ChartKind::Rates, ChartKind::Ratios, ChartKind::ConversionDiff];

    pub fn file_stem(&self) -> &'static str {
        match self {
            ChartKind::Rates => "rates",
            ChartKind::Ratios => "ratios",
            ChartKind::ConversionDiff => "diff",
        }
    }
}

impl Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// One candlestick. `low`/`high` span the pair, `open`/`close` encode the
/// direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Candles(Vec<Candle>),
    Line { name: String, points: Vec<Decimal> },
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Candles(candles) => candles.len(),
            Series::Line { points, .. } => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub min: Decimal,
    pub max: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub title: String,
    pub series: Series,
    /// Position -> `MM/DD` label, one per calendar day
    pub labels: BTreeMap<usize, String>,
    pub bounds: Option<AxisBounds>,
    pub y_increment: Option<Decimal>,
    pub highlight: Option<usize>,
}

/// Date labels, one per run of same-day observations, placed on the last
/// observation of each run.
pub fn compress_labels(rates: &[RateObservation]) -> BTreeMap<usize, String> {
    let mut labels = BTreeMap::new();
    for (index, rate) in rates.iter().enumerate() {
        let date = rate.observed_at.date_naive();
        let run_continues = rates
            .get(index + 1)
            .is_some_and(|next| next.observed_at.date_naive() == date);
        if !run_continues {
            labels.insert(index, date.format("%m/%d").to_string());
        }
    }
    labels
}

fn observed_bounds(points: &[Decimal]) -> Option<AxisBounds> {
    let min = points.iter().min()?;
    let max = points.iter().max()?;
    Some(AxisBounds {
        min: *min,
        max: *max,
    })
}

/// Candlestick chart of buy/sell pairs with the tightest spread flipped.
pub fn rate_chart(rates: &[RateObservation], currency_label: &str) -> ChartSeries {
    let highlight = min_diff_index(rates);
    let candles: Vec<Candle> = rates
        .iter()
        .enumerate()
        .map(|(index, rate)| {
            let (open, close) = if Some(index) == highlight {
                (rate.sell, rate.buy)
            } else {
                (rate.buy, rate.sell)
            };
            Candle {
                open,
                high: rate.buy.max(rate.sell),
                low: rate.buy.min(rate.sell),
                close,
            }
        })
        .collect();

    let bounds = candles.iter().map(|c| c.high).max().map(|max| AxisBounds {
        min: min_value_in_increments(rates, RATE_AXIS_INCREMENT),
        max,
    });
    let title = match rates.last() {
        Some(last) => format!("{currency_label} Rates\n{}/{}", last.buy, last.sell),
        None => format!("{currency_label} Rates\nN/A/N/A"),
    };

    ChartSeries {
        kind: ChartKind::Rates,
        title,
        series: Series::Candles(candles),
        labels: compress_labels(rates),
        bounds,
        y_increment: Some(RATE_AXIS_INCREMENT),
        highlight,
    }
}

/// Line chart of the percent spread.
pub fn ratio_chart(
    rates: &[RateObservation],
    currency_label: &str,
) -> Result<ChartSeries, RateError> {
    let points = rates
        .iter()
        .map(metrics::ratio)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(line_chart(
        ChartKind::Ratios,
        &format!("{currency_label} Sell/Buy Ratios"),
        "Ratio",
        points,
        rates,
    ))
}

/// Line chart of the conversion difference within `limit`.
pub fn diff_chart(
    rates: &[RateObservation],
    limit: Decimal,
    currency_label: &str,
) -> Result<ChartSeries, RateError> {
    let points = rates
        .iter()
        .map(|rate| metrics::conversion_diff(rate, limit))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(line_chart(
        ChartKind::ConversionDiff,
        &format!("Conversion difference, {currency_label}"),
        "Difference",
        points,
        rates,
    ))
}

fn line_chart(
    kind: ChartKind,
    title: &str,
    name: &str,
    points: Vec<Decimal>,
    rates: &[RateObservation],
) -> ChartSeries {
    ChartSeries {
        kind,
        title: title.to_string(),
        bounds: observed_bounds(&points),
        series: Series::Line {
            name: name.to_string(),
            points,
        },
        labels: compress_labels(rates),
        y_increment: None,
        highlight: None,
    }
}

/// Prepares one chart of `kind`.
pub fn prepare(
    kind: ChartKind,
    rates: &[RateObservation],
    limit: Decimal,
    currency_label: &str,
) -> Result<ChartSeries, RateError> {
    match kind {
        ChartKind::Rates => Ok(rate_chart(rates, currency_label)),
        ChartKind::Ratios => ratio_chart(rates, currency_label),
        ChartKind::ConversionDiff => diff_chart(rates, limit, currency_label),
    }
}

/// Prepares every chart, in [`ChartKind::ALL`] order.
pub fn prepare_all(
    rates: &[RateObservation],
    limit: Decimal,
    currency_label: &str,
) -> Result<Vec<ChartSeries>, RateError> {
    ChartKind::ALL
        .iter()
        .map(|kind| prepare(*kind, rates, limit, currency_label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::DEFAULT_LIMIT;
    use chrono::{Local, TimeZone};
    use rust_decimal_macros::dec;

    fn rate(buy: Decimal, sell: Decimal, month: u32, day: u32, hour: u32) -> RateObservation {
        RateObservation {
            id: None,
            buy,
            sell,
            observed_at: Local.with_ymd_and_hms(2025, month, day, hour, 0, 0).unwrap(),
        }
    }

    fn window() -> Vec<RateObservation> {
        vec![
            rate(dec!(40.5), dec!(41.0), 3, 1, 9),
            rate(dec!(40.6), dec!(40.9), 3, 1, 15),
            rate(dec!(40.73), dec!(41.5), 3, 2, 9),
        ]
    }

    #[test]
    fn test_labels_keep_last_index_of_each_day() {
        let labels = compress_labels(&window());
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(&1).map(String::as_str), Some("03/01"));
        assert_eq!(labels.get(&2).map(String::as_str), Some("03/02"));
    }

    #[test]
    fn test_labels_for_non_adjacent_same_dates() {
        let rates = vec![
            rate(dec!(40.5), dec!(41.0), 3, 1, 9),
            rate(dec!(40.5), dec!(41.0), 3, 2, 9),
            rate(dec!(40.5), dec!(41.0), 3, 2, 10),
            rate(dec!(40.5), dec!(41.0), 3, 3, 10),
        ];
        let labels = compress_labels(&rates);
        assert_eq!(labels.keys().copied().collect::<Vec<_>>(), vec![0, 2, 3]);
        assert!(compress_labels(&[]).is_empty());
    }

    #[test]
    fn test_rate_chart_flips_min_spread_candle() {
        let chart = rate_chart(&window(), "USD");
        assert_eq!(chart.highlight, Some(1));
        let Series::Candles(candles) = &chart.series else {
            panic!("Expected candles");
        };
        assert_eq!(candles.len(), 3);
        assert_eq!(
            candles[0],
            Candle {
                open: dec!(40.5),
                high: dec!(41.0),
                low: dec!(40.5),
                close: dec!(41.0)
            }
        );
        assert_eq!(
            candles[1],
            Candle {
                open: dec!(40.9),
                high: dec!(40.9),
                low: dec!(40.6),
                close: dec!(40.6)
            }
        );
        assert_eq!(candles[2].open, dec!(40.73));
        assert_eq!(candles[2].close, dec!(41.5));
    }

    #[test]
    fn test_rate_chart_axis_and_title() {
        let chart = rate_chart(&window(), "USD");
        assert_eq!(
            chart.bounds,
            Some(AxisBounds {
                min: dec!(40.5),
                max: dec!(41.5)
            })
        );
        assert_eq!(chart.y_increment, Some(dec!(0.1)));
        assert_eq!(chart.title, "USD Rates\n40.73/41.5");
    }

    #[test]
    fn test_rate_chart_empty_window() {
        let chart = rate_chart(&[], "USD");
        assert!(chart.series.is_empty());
        assert!(chart.bounds.is_none());
        assert!(chart.highlight.is_none());
        assert_eq!(chart.title, "USD Rates\nN/A/N/A");
    }

    #[test]
    fn test_ratio_chart_bounds_follow_series() {
        let chart = ratio_chart(&window(), "USD").unwrap();
        let Series::Line { points, .. } = &chart.series else {
            panic!("Expected a line");
        };
        assert_eq!(points, &vec![dec!(1.23), dec!(0.74), dec!(1.89)]);
        assert_eq!(
            chart.bounds,
            Some(AxisBounds {
                min: dec!(0.74),
                max: dec!(1.89)
            })
        );
        assert!(chart.highlight.is_none());
    }

    #[test]
    fn test_diff_chart_points() {
        let chart = diff_chart(&window(), DEFAULT_LIMIT, "USD").unwrap();
        let Series::Line { points, .. } = &chart.series else {
            panic!("Expected a line");
        };
        assert_eq!(points[0], dec!(15.06));
        assert_eq!(chart.labels.len(), 2);
    }

    #[test]
    fn test_prepare_all_keeps_fixed_order() {
        let charts = prepare_all(&window(), DEFAULT_LIMIT, "USD").unwrap();
        assert_eq!(
            charts.iter().map(|c| c.kind).collect::<Vec<_>>(),
            ChartKind::ALL.to_vec()
        );
        assert!(charts.iter().all(|c| c.series.len() == 3));
    }

    #[test]
    fn test_titles_use_currency_label() {
        let charts = prepare_all(&window(), DEFAULT_LIMIT, "EUR").unwrap();
        assert_eq!(charts[0].title, "EUR Rates\n40.73/41.5");
        assert_eq!(charts[1].title, "EUR Sell/Buy Ratios");
        assert_eq!(charts[2].title, "Conversion difference, EUR");
        assert!(charts.iter().all(|c| !c.title.contains("USD")));
    }

    #[test]
    fn test_prepare_all_rejects_invalid_rates() {
        let mut rates = window();
        rates[1].buy = Decimal::ZERO;
        assert!(prepare_all(&rates, DEFAULT_LIMIT, "USD").is_err());
    }
}
