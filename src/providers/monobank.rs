use crate::core::config::MonobankProviderConfig;
use crate::core::error::SourceError;
use crate::core::rate::RatePair;
use crate::core::source::RateSource;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Public currency rates from the Monobank API.
pub struct MonobankSource {
    base_url: String,
    currency_code: u32,
    base_currency_code: u32,
    client: reqwest::Client,
}

impl MonobankSource {
    pub fn new(config: &MonobankProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fxwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(MonobankSource {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            currency_code: config.currency_code,
            base_currency_code: config.base_currency_code,
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyInfo {
    currency_code_a: u32,
    currency_code_b: u32,
    rate_buy: Option<Decimal>,
    rate_sell: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "errorDescription", alias = "errText")]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CurrencyResponse {
    Rates(Vec<CurrencyInfo>),
    Error(ErrorBody),
}

fn error_for_status(status: StatusCode, body: &str) -> SourceError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| format!("HTTP {status}"));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimit(message),
        s if s.is_client_error() => SourceError::Validation(message),
        _ => SourceError::Server(message),
    }
}

#[async_trait]
impl RateSource for MonobankSource {
    #[instrument(
        name = "MonobankFetch",
        skip(self),
        fields(pair = %format!("{}/{}", self.currency_code, self.base_currency_code))
    )]
    async fn fetch(&self) -> Result<RatePair> {
        let url = format!("{}/bank/currency", self.base_url);
        debug!("Requesting currency rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Request error for URL {url}: {e}")))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SourceError::Network(format!("Failed to read Monobank response: {e}"))
        })?;

        if !status.is_success() {
            return Err(error_for_status(status, &body).into());
        }

        let parsed: CurrencyResponse = serde_json::from_str(&body).map_err(|e| {
            SourceError::Validation(format!("Failed to parse Monobank response: {e}"))
        })?;
        let rates = match parsed {
            CurrencyResponse::Rates(rates) => rates,
            CurrencyResponse::Error(e) => return Err(SourceError::Validation(e.message).into()),
        };

        let info = rates
            .into_iter()
            .find(|r| {
                r.currency_code_a == self.currency_code
                    && r.currency_code_b == self.base_currency_code
            })
            .ok_or_else(|| {
                SourceError::Validation(format!(
                    "No rate for currency pair {}/{}",
                    self.currency_code, self.base_currency_code
                ))
            })?;

        match (info.rate_buy, info.rate_sell) {
            (Some(buy), Some(sell)) => {
                debug!(%buy, %sell, "Received Monobank rates");
                Ok(RatePair { buy, sell })
            }
            _ => Err(SourceError::Validation(format!(
                "Missing buy/sell rate for currency pair {}/{}",
                self.currency_code, self.base_currency_code
            ))
            .into()),
        }
    }
}
