use super::ui;
use crate::App;
use crate::core::workflow::{Outcome, RatesUpdate};
use anyhow::{Result, bail};
use chrono::Local;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// One-line, styled summary of a cycle.
pub fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Skipped => ui::style_text("Rates unchanged, nothing sent", ui::StyleType::Subtle),
        Outcome::Reported {
            persisted: Some(stored),
            images,
        } => ui::style_text(
            &format!(
                "Reported {}/{} with {images} chart(s), stored as #{}",
                stored.buy,
                stored.sell,
                stored.id.unwrap_or_default()
            ),
            ui::StyleType::Success,
        ),
        Outcome::Reported {
            persisted: None,
            images,
        } => ui::style_text(
            &format!("Rehearsal report sent with {images} chart(s), nothing stored"),
            ui::StyleType::Warning,
        ),
        Outcome::Failed { class, message } => ui::style_text(
            &format!("Update failed ({class}): {message}"),
            ui::StyleType::Error,
        ),
    }
}

pub async fn run_once(app: &App, dry_run: bool) -> Result<()> {
    let spinner = ui::new_spinner("Updating rates...");
    let outcome = app.update().run(Local::now(), app.rehearsal(dry_run)).await;
    spinner.finish_and_clear();

    println!("{}", describe(&outcome));
    if let Outcome::Failed { class, message } = outcome {
        bail!("Rates update failed ({class}): {message}");
    }
    Ok(())
}

/// Runs a cycle on every tick of `period` until `shutdown` resolves.
/// Returns the number of cycles run.
pub async fn watch_until<F>(
    update: &RatesUpdate<'_>,
    period: Duration,
    force: bool,
    shutdown: F,
) -> usize
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut cycles = 0;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(cycles, "Stopping watch");
                return cycles;
            }
            _ = ticker.tick() => {
                let outcome = update.run(Local::now(), force).await;
                cycles += 1;
                println!(
                    "{} {}",
                    ui::style_text(&Local::now().format("%Y-%m-%d %H:%M").to_string(), ui::StyleType::Subtle),
                    describe(&outcome)
                );
            }
        }
    }
}

pub async fn watch(app: &App, period: Duration, dry_run: bool) -> Result<()> {
    info!(minutes = period.as_secs() / 60, "Watching rates, press Ctrl-C to stop");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };
    watch_until(&app.update(), period, app.rehearsal(dry_run), shutdown).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chart::ChartSeries;
    use crate::core::config::ReportConfig;
    use crate::core::error::SourceError;
    use crate::core::notify::Notifier;
    use crate::core::rate::{RateObservation, RatePair};
    use crate::core::render::{ChartImage, ChartRenderer};
    use crate::core::source::RateSource;
    use crate::store::MemoryRateHistory;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DownSource(AtomicUsize);

    #[async_trait]
    impl RateSource for DownSource {
        async fn fetch(&self) -> Result<RatePair> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(SourceError::Server("maintenance".into()).into())
        }
    }

    struct Unused;

    #[async_trait]
    impl ChartRenderer for Unused {
        async fn render(&self, _chart: &ChartSeries) -> Result<ChartImage> {
            unreachable!("nothing to render when the source is down")
        }
    }

    #[async_trait]
    impl Notifier for Unused {
        async fn send(&self, _message: &str, _images: &[ChartImage]) -> Result<()> {
            unreachable!("nothing to send when the source is down")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_keeps_running_after_failures() {
        let source = DownSource(AtomicUsize::new(0));
        let history = MemoryRateHistory::new(45);
        let settings = ReportConfig::default();
        let update = RatesUpdate {
            source: &source,
            history: &history,
            renderer: &Unused,
            notifier: &Unused,
            settings: &settings,
        };

        let period = Duration::from_secs(60);
        let shutdown = tokio::time::sleep(period * 2 + Duration::from_secs(1));
        let cycles = watch_until(&update, period, false, shutdown).await;

        assert_eq!(cycles, 3);
        assert_eq!(source.0.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_describe_outcomes() {
        let stored = RateObservation {
            id: Some(7),
            buy: rust_decimal_macros::dec!(41.33),
            sell: rust_decimal_macros::dec!(41.8305),
            observed_at: Local::now(),
        };
        let text = describe(&Outcome::Reported {
            persisted: Some(stored),
            images: 3,
        });
        assert!(text.contains("41.33/41.8305"));
        assert!(text.contains("#7"));

        let text = describe(&Outcome::Failed {
            class: "rate_limit",
            message: "Failed to fetch rates".into(),
        });
        assert!(text.contains("rate_limit"));
        assert!(describe(&Outcome::Skipped).contains("unchanged"));
    }
}
