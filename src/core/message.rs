//! Report message composition
use crate::core::metrics::MetricsSummary;
use crate::core::rate::{RateError, RateObservation};
use chrono::{DateTime, Local};
use rust_decimal::Decimal;

/// Builds the HTML report for `rate`, sent as the caption of the charts.
pub fn compose(
    rate: &RateObservation,
    limit: Decimal,
    currency_label: &str,
    now: DateTime<Local>,
) -> Result<String, RateError> {
    let metrics = MetricsSummary::compute(rate, limit)?;
    let limit_label = (limit / Decimal::ONE_THOUSAND).normalize();

    Ok(format!(
        "<b><i>{}</i></b>\n\
         <b>{currency_label} Buy:</b> {}, <b>{currency_label} Sell:</b> {}\n\
         <b>Ratio:</b> {}% (₴{})\n\
         <b>{limit_label}K amount:</b> ${}\n\
         <b>To sell:</b> ${}\n\
         <b>Diff:</b> ${}\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        rate.buy,
        rate.sell,
        metrics.ratio,
        metrics.commission,
        metrics.max_to_buy,
        metrics.sell_to_limit,
        metrics.conversion_diff,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::DEFAULT_LIMIT;
    use crate::core::rate::RatePair;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_message_contains_all_fields() {
        let now = Local.with_ymd_and_hms(2025, 5, 14, 9, 0, 0).unwrap();
        let rate = RateObservation::candidate(
            RatePair {
                buy: dec!(40.5),
                sell: dec!(41.0),
            },
            now,
        )
        .unwrap();

        let message = compose(&rate, DEFAULT_LIMIT, "USD", now).unwrap();
        assert_eq!(
            message,
            "<b><i>2025-05-14 09:00:00</i></b>\n\
             <b>USD Buy:</b> 40.5, <b>USD Sell:</b> 41.0\n\
             <b>Ratio:</b> 1.23% (₴500.0)\n\
             <b>50K amount:</b> $1219.51\n\
             <b>To sell:</b> $1234.57\n\
             <b>Diff:</b> $15.06\n"
        );
    }

    #[test]
    fn test_message_uses_limit_label() {
        let now = Local.with_ymd_and_hms(2025, 5, 14, 9, 0, 0).unwrap();
        let rate = RateObservation::candidate(
            RatePair {
                buy: dec!(40.0),
                sell: dec!(50.0),
            },
            now,
        )
        .unwrap();

        let message = compose(&rate, dec!(100000), "EUR", now).unwrap();
        assert!(message.contains("<b>EUR Buy:</b> 40.0"));
        assert!(message.contains("<b>100K amount:</b> $2000"));
    }

    #[test]
    fn test_message_fails_for_out_of_range_rates() {
        let now = Local.with_ymd_and_hms(2025, 5, 14, 9, 0, 0).unwrap();
        let rate = RateObservation::candidate(
            RatePair {
                buy: dec!(0.00000000000000000001),
                sell: Decimal::MAX,
            },
            now,
        )
        .unwrap();

        assert!(matches!(
            compose(&rate, DEFAULT_LIMIT, "USD", now),
            Err(RateError::Overflow { .. })
        ));
    }
}
