//! Rate source abstraction

use crate::core::rate::RatePair;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<RatePair>;
}
