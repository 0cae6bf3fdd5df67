use crate::error::Result;
use crate::types::FetchedPage;
use async_trait::async_trait;

/// Fetches the raw markup of one page. A transport failure is an `Err`;
/// a non-success status is returned as a page for the caller to judge.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Looks up how many `quote` units one `base` unit is worth.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn get_rate(&self, base: &str, quote: &str) -> Result<f64>;
}

/// Free-text machine translation.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String>;
}
