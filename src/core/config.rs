use crate::core::metrics::DEFAULT_LIMIT;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_TOKEN";
const TELEGRAM_CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportConfig {
    /// Size of the retention window
    #[serde(default = "default_max_records")]
    pub max_records: usize,
    /// Local hour after which one report per day is forced
    #[serde(default = "default_reporting_hour")]
    pub reporting_hour: u32,
    /// Reference amount for conversion figures
    #[serde(default = "default_limit")]
    pub limit: Decimal,
    #[serde(default = "default_currency_label")]
    pub currency_label: String,
    /// Always report and never persist
    #[serde(default)]
    pub rehearsal: bool,
}

fn default_max_records() -> usize {
    45
}

fn default_reporting_hour() -> u32 {
    9
}

fn default_limit() -> Decimal {
    DEFAULT_LIMIT
}

fn default_currency_label() -> String {
    "USD".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            max_records: default_max_records(),
            reporting_hour: default_reporting_hour(),
            limit: default_limit(),
            currency_label: default_currency_label(),
            rehearsal: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonobankProviderConfig {
    #[serde(default = "default_monobank_url")]
    pub base_url: String,
    #[serde(default = "default_currency_code")]
    pub currency_code: u32,
    #[serde(default = "default_base_currency_code")]
    pub base_currency_code: u32,
}

fn default_monobank_url() -> String {
    "https://api.monobank.ua".to_string()
}

fn default_currency_code() -> u32 {
    840
}

fn default_base_currency_code() -> u32 {
    980
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramProviderConfig {
    #[serde(default = "default_telegram_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for MonobankProviderConfig {
    fn default() -> Self {
        MonobankProviderConfig {
            base_url: default_monobank_url(),
            currency_code: default_currency_code(),
            base_currency_code: default_base_currency_code(),
        }
    }
}

impl Default for TelegramProviderConfig {
    fn default() -> Self {
        TelegramProviderConfig {
            base_url: default_telegram_url(),
            token: None,
            chat_id: None,
        }
    }
}

impl TelegramProviderConfig {
    /// Bot token from the config file or `TELEGRAM_TOKEN`.
    pub fn resolve_token(&self) -> Result<String> {
        self.token
            .clone()
            .or_else(|| std::env::var(TELEGRAM_TOKEN_ENV).ok())
            .with_context(|| format!("Telegram token is not configured, set {TELEGRAM_TOKEN_ENV}"))
    }

    /// Chat id from the config file or `TELEGRAM_CHAT_ID`.
    pub fn resolve_chat_id(&self) -> Result<String> {
        self.chat_id
            .clone()
            .or_else(|| std::env::var(TELEGRAM_CHAT_ID_ENV).ok())
            .with_context(|| {
                format!("Telegram chat id is not configured, set {TELEGRAM_CHAT_ID_ENV}")
            })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub monobank: MonobankProviderConfig,
    pub telegram: TelegramProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxwatch", "fxwatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "fxwatch", "fxwatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn history_path(&self) -> Result<PathBuf> {
        Ok(self.default_data_path()?.join("history"))
    }

    pub fn charts_path(&self) -> Result<PathBuf> {
        Ok(self.default_data_path()?.join("charts"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.report.max_records == 0 {
            bail!("report.max_records must be greater than zero");
        }
        if self.report.reporting_hour > 23 {
            bail!(
                "report.reporting_hour must be between 0 and 23, got {}",
                self.report.reporting_hour
            );
        }
        if self.report.limit <= Decimal::ZERO {
            bail!("report.limit must be positive, got {}", self.report.limit);
        }
        Ok(())
    }
}
