use crate::core::config::TelegramProviderConfig;
use crate::core::error::DispatchError;
use crate::core::notify::Notifier;
use crate::core::render::ChartImage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Sends reports through the Telegram Bot API.
pub struct TelegramNotifier {
    base_url: String,
    token: String,
    chat_id: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct InputMediaDocument<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramProviderConfig) -> Result<Self> {
        Ok(Self::with_credentials(
            &config.base_url,
            &config.resolve_token()?,
            &config.resolve_chat_id()?,
        ))
    }

    pub fn with_credentials(base_url: &str, token: &str, chat_id: &str) -> Self {
        TelegramNotifier {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn attachment(image: &ChartImage) -> Result<Part> {
        let bytes = tokio::fs::read(&image.path)
            .await
            .with_context(|| format!("Failed to read chart: {}", image.path.display()))?;
        Ok(Part::bytes(bytes)
            .file_name(image.file_name.clone())
            .mime_str(image.mime)?)
    }

    async fn media_group_form(&self, message: &str, images: &[ChartImage]) -> Result<Form> {
        let media: Vec<InputMediaDocument> = images
            .iter()
            .enumerate()
            .map(|(index, image)| InputMediaDocument {
                kind: "document",
                media: format!("attach://{}", image.file_name),
                caption: (index == 0).then_some(message),
                parse_mode: (index == 0).then_some("HTML"),
            })
            .collect();

        let mut form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("media", serde_json::to_string(&media)?);
        for image in images {
            form = form.part(image.file_name.clone(), Self::attachment(image).await?);
        }
        Ok(form)
    }

    async fn post(&self, method: &str, form: Form) -> Result<()> {
        let url = self.method_url(method);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DispatchError(format!("Request error for Telegram method {method}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError(format!("Failed to read Telegram response: {e}")))?;
        debug!(%status, "Received Telegram response");

        let parsed: Option<TelegramResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(TelegramResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(TelegramResponse {
                description: Some(description),
                ..
            }) => Err(DispatchError(description).into()),
            _ => Err(DispatchError(format!("HTTP {status}")).into()),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(name = "TelegramSend", skip(self, message, images), fields(images = images.len()))]
    async fn send(&self, message: &str, images: &[ChartImage]) -> Result<()> {
        match images {
            [] => {
                let form = Form::new()
                    .text("chat_id", self.chat_id.clone())
                    .text("text", message.to_string())
                    .text("parse_mode", "HTML");
                self.post("sendMessage", form).await
            }
            [image] => {
                let form = Form::new()
                    .text("chat_id", self.chat_id.clone())
                    .text("caption", message.to_string())
                    .text("parse_mode", "HTML")
                    .part("document", Self::attachment(image).await?);
                self.post("sendDocument", form).await
            }
            _ => {
                let form = self.media_group_form(message, images).await?;
                self.post("sendMediaGroup", form).await
            }
        }
    }
}
