//! Chart rendering abstraction

use crate::core::chart::ChartSeries;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// A rendered chart ready to be attached to a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: &'static str,
}

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, chart: &ChartSeries) -> Result<ChartImage>;
}
