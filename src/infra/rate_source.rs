use crate::app::ports::RateSource;
use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

/// Reads `GET {base_url}/{BASE}` returning `{"rates": {"QUOTE": rate, ...}}`.
pub struct HttpRateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateSource {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn get_rate(&self, base: &str, quote: &str) -> Result<f64> {
        let url = format!("{}/{}", self.base_url, base);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ScraperError::Api {
                message: format!("rate lookup failed with status: {}", response.status()),
            });
        }

        let body: LatestRates = response.json().await?;
        body.rates
            .get(quote)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| ScraperError::Api {
                message: format!("no usable {quote} rate in response for {base}"),
            })
    }
}
