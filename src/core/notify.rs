//! Notification channel abstraction

use crate::core::render::ChartImage;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message` together with `images`, in the given order.
    async fn send(&self, message: &str, images: &[ChartImage]) -> Result<()>;
}
