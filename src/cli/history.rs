use super::ui;
use crate::core::config::ReportConfig;
use crate::core::history::RateHistory;
use crate::core::metrics::{MetricsSummary, min_diff_index};
use crate::core::rate::RateObservation;
use anyhow::Result;
use comfy_table::{Cell, Color, Table};
use rust_decimal::Decimal;

const MIN_SPREAD_MARK: &str = "◀ min spread";

/// Table of `rates` with their metrics. The tightest spread is marked.
pub fn history_table(rates: &[RateObservation], limit: Decimal) -> Result<Table> {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Observed"),
        ui::header_cell("Buy"),
        ui::header_cell("Sell"),
        ui::header_cell("Ratio (%)"),
        ui::header_cell("Commission"),
        ui::header_cell("Diff ($)"),
        ui::header_cell(""),
    ]);

    let highlight = min_diff_index(rates);
    for (index, rate) in rates.iter().enumerate() {
        let metrics = MetricsSummary::compute(rate, limit)?;
        let is_min = Some(index) == highlight;
        table.add_row(vec![
            Cell::new(rate.id.map_or("-".to_string(), |id| id.to_string())).fg(Color::DarkGrey),
            Cell::new(rate.observed_at.format("%Y-%m-%d %H:%M").to_string()),
            ui::decimal_cell(rate.buy, is_min),
            ui::decimal_cell(rate.sell, is_min),
            ui::decimal_cell(metrics.ratio, is_min),
            ui::decimal_cell(metrics.commission, false),
            ui::decimal_cell(metrics.conversion_diff, false),
            if is_min {
                Cell::new(MIN_SPREAD_MARK).fg(Color::Green)
            } else {
                Cell::new("")
            },
        ]);
    }
    Ok(table)
}

pub async fn show(
    history: &dyn RateHistory,
    settings: &ReportConfig,
    limit: Option<usize>,
) -> Result<()> {
    let rates = match limit {
        Some(n) => history.last_n(n.min(history.max_records())).await?,
        None => history.window().await?,
    };

    println!(
        "{}\n",
        ui::style_text(
            &format!("{} rates ({} of {})", settings.currency_label, rates.len(), history.max_records()),
            ui::StyleType::Title
        )
    );
    if rates.is_empty() {
        println!("{}", ui::style_text("No rates stored yet", ui::StyleType::Subtle));
        return Ok(());
    }

    println!("{}", history_table(&rates, settings.limit)?);
    if let Some(last) = rates.last() {
        let metrics = MetricsSummary::compute(last, settings.limit)?;
        println!(
            "\n{} {} to buy, {} to sell at the latest rate",
            ui::style_text("Limit:", ui::StyleType::Label),
            metrics.max_to_buy,
            metrics.sell_to_limit
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::DEFAULT_LIMIT;
    use crate::core::rate::RatePair;
    use crate::store::MemoryRateHistory;
    use chrono::{Local, TimeZone};
    use rust_decimal_macros::dec;

    fn rates() -> Vec<RateObservation> {
        [(dec!(40.5), dec!(41.0), 1), (dec!(40.6), dec!(40.9), 2), (dec!(40.0), dec!(41.0), 3)]
            .into_iter()
            .map(|(buy, sell, day)| RateObservation {
                id: Some(day as u64),
                buy,
                sell,
                observed_at: Local.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_history_table_marks_min_spread() {
        let table = history_table(&rates(), DEFAULT_LIMIT).unwrap();
        assert_eq!(table.row_count(), 3);

        let rendered = table.to_string();
        assert!(rendered.contains("2025-03-02 09:00"));
        assert!(rendered.contains("15.06"));
        assert_eq!(rendered.matches(MIN_SPREAD_MARK).count(), 1);

        let marked = table.row(1).unwrap().cell_iter().last().unwrap().content();
        assert_eq!(marked, MIN_SPREAD_MARK);
    }

    #[test]
    fn test_history_table_rejects_invalid_rates() {
        let mut rates = rates();
        rates[0].buy = Decimal::ZERO;
        assert!(history_table(&rates, DEFAULT_LIMIT).is_err());
    }

    #[tokio::test]
    async fn test_show_handles_empty_and_limited_history() {
        let history = MemoryRateHistory::new(45);
        let settings = ReportConfig::default();
        show(&history, &settings, None).await.unwrap();

        for rate in rates() {
            let candidate = RateObservation::candidate(
                RatePair {
                    buy: rate.buy,
                    sell: rate.sell,
                },
                rate.observed_at,
            )
            .unwrap();
            history.insert_and_trim(candidate).await.unwrap();
        }
        show(&history, &settings, Some(2)).await.unwrap();
        show(&history, &settings, Some(1000)).await.unwrap();
    }
}
