pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::workflow::RatesUpdate;
use crate::providers::{MonobankSource, SvgRenderer, TelegramNotifier};
use crate::store::DiskRateHistory;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Run { dry_run: bool },
    Watch { interval_minutes: u64, dry_run: bool },
    History { limit: Option<usize> },
}

/// Collaborators wired from the configuration.
pub struct App {
    pub config: AppConfig,
    pub history: DiskRateHistory,
    pub source: MonobankSource,
    pub renderer: SvgRenderer,
    pub notifier: TelegramNotifier,
}

impl App {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let history = open_history(&config)?;
        let source = MonobankSource::new(&config.providers.monobank)?;
        let notifier = TelegramNotifier::new(&config.providers.telegram)?;
        let renderer = SvgRenderer::new(config.charts_path()?);

        Ok(App {
            config,
            history,
            source,
            renderer,
            notifier,
        })
    }

    pub fn update(&self) -> RatesUpdate<'_> {
        RatesUpdate {
            source: &self.source,
            history: &self.history,
            renderer: &self.renderer,
            notifier: &self.notifier,
            settings: &self.config.report,
        }
    }

    /// Whether reports should bypass the gate and skip persistence.
    pub fn rehearsal(&self, dry_run: bool) -> bool {
        dry_run || self.config.report.rehearsal
    }
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

fn open_history(config: &AppConfig) -> Result<DiskRateHistory> {
    DiskRateHistory::open(&config.history_path()?, config.report.max_records)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxwatch starting...");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Run { dry_run } => {
            let app = App::from_config(config)?;
            cli::report::run_once(&app, dry_run).await
        }
        AppCommand::Watch {
            interval_minutes,
            dry_run,
        } => {
            let app = App::from_config(config)?;
            let period = Duration::from_secs(interval_minutes.max(1) * 60);
            cli::report::watch(&app, period, dry_run).await
        }
        AppCommand::History { limit } => {
            let history = open_history(&config)?;
            cli::history::show(&history, &config.report, limit).await
        }
    }
}
