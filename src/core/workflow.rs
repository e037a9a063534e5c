//! The rate update cycle: fetch, gate, persist, chart, report.
use crate::core::chart;
use crate::core::config::ReportConfig;
use crate::core::decision::{self, Decision};
use crate::core::error::classify;
use crate::core::history::RateHistory;
use crate::core::message;
use crate::core::notify::Notifier;
use crate::core::rate::RateObservation;
use crate::core::render::ChartRenderer;
use crate::core::source::RateSource;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use futures::future::try_join_all;
use tracing::{error, info, instrument};

/// What a single cycle did.
#[derive(Debug)]
pub enum Outcome {
    /// Rates were unchanged, nothing stored or sent
    Skipped,
    Reported {
        persisted: Option<RateObservation>,
        images: usize,
    },
    /// The cycle failed; the error has already been logged
    Failed { class: &'static str, message: String },
}

pub struct RatesUpdate<'a> {
    pub source: &'a dyn RateSource,
    pub history: &'a dyn RateHistory,
    pub renderer: &'a dyn ChartRenderer,
    pub notifier: &'a dyn Notifier,
    pub settings: &'a ReportConfig,
}

impl RatesUpdate<'_> {
    /// Runs one cycle. Never returns an error: failures are logged and
    /// reported as [`Outcome::Failed`] so a scheduler can keep going.
    #[instrument(name = "RatesUpdate", skip(self), fields(rehearsal = force))]
    pub async fn run(&self, now: DateTime<Local>, force: bool) -> Outcome {
        match self.try_run(now, force).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let class = classify(&e);
                error!(error.class = class, error = %e, "Rates update failed: {e:?}");
                Outcome::Failed {
                    class,
                    message: format!("{e:#}"),
                }
            }
        }
    }

    async fn try_run(&self, now: DateTime<Local>, force: bool) -> Result<Outcome> {
        let pair = self.source.fetch().await.context("Failed to fetch rates")?;
        let candidate = RateObservation::candidate(pair, now)?;
        info!(buy = %candidate.buy, sell = %candidate.sell, rehearsal = force, "Fetched rates");

        let decision = decision::evaluate(
            &candidate,
            self.history,
            now,
            force,
            self.settings.reporting_hour,
        )
        .await?;
        if decision == Decision::Skip {
            info!("Rates are the same, skipping report");
            return Ok(Outcome::Skipped);
        }

        let persisted = if decision.persists() {
            let stored = self
                .history
                .insert_and_trim(candidate.clone())
                .await
                .context("Failed to store rates")?;
            info!(id = ?stored.id, "Stored rates");
            Some(stored)
        } else {
            None
        };

        let window = self.history.window().await?;
        let charts = chart::prepare_all(
            &window,
            self.settings.limit,
            &self.settings.currency_label,
        )?;
        let images = try_join_all(charts.iter().map(|c| self.renderer.render(c)))
            .await
            .context("Failed to render charts")?;

        let text = message::compose(
            &candidate,
            self.settings.limit,
            &self.settings.currency_label,
            now,
        )?;
        self.notifier
            .send(&text, &images)
            .await
            .context("Failed to send report")?;
        info!(%decision, images = images.len(), "Report sent");

        Ok(Outcome::Reported {
            persisted,
            images: images.len(),
        })
    }
}
