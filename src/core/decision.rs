//! Decides whether a fetched rate is worth reporting.
//!
//! Two triggers are OR-ed: the rate changed since the last stored
//! observation, or the reporting hour has passed and nothing has been stored
//! today. A forced (rehearsal) run always proceeds and never persists.
use crate::core::history::RateHistory;
use crate::core::rate::RateObservation;
use anyhow::Result;
use chrono::{DateTime, Local, Timelike};
use std::fmt::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    ProceedAndPersist,
    ProceedNoPersist,
    Skip,
}

impl Decision {
    pub fn proceeds(&self) -> bool {
        !matches!(self, Decision::Skip)
    }

    pub fn persists(&self) -> bool {
        matches!(self, Decision::ProceedAndPersist)
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Decision::ProceedAndPersist => "proceed_and_persist",
                Decision::ProceedNoPersist => "proceed_no_persist",
                Decision::Skip => "skip",
            }
        )
    }
}

/// Evaluates the gate for `candidate` against the stored history.
pub async fn evaluate(
    candidate: &RateObservation,
    history: &dyn RateHistory,
    now: DateTime<Local>,
    force: bool,
    reporting_hour: u32,
) -> Result<Decision> {
    if force {
        return Ok(Decision::ProceedNoPersist);
    }

    let Some(previous) = history.last_known().await? else {
        debug!("No stored rates yet");
        return Ok(Decision::ProceedAndPersist);
    };

    let reporting_window =
        now.hour() >= reporting_hour && !history.has_observation_today(now.date_naive()).await?;
    if reporting_window {
        debug!("Daily report is due");
        return Ok(Decision::ProceedAndPersist);
    }

    if *candidate == previous {
        debug!(buy = %previous.buy, sell = %previous.sell, "Rates unchanged");
        return Ok(Decision::Skip);
    }

    Ok(Decision::ProceedAndPersist)
}
