use crate::error::{Result, ScraperError};
use crate::pipeline::pacing::{is_valid_window, MAX_PACE_SECONDS};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Environment variable overriding `[currency].fallback_rate`
pub const FALLBACK_RATE_ENV: &str = "MARKET_SCRAPER_FALLBACK_RATE";
/// Environment variable overriding `[currency].rate_api_url`
pub const RATE_API_URL_ENV: &str = "MARKET_SCRAPER_RATE_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub run: RunConfig,
    pub http: HttpConfig,
    pub currency: CurrencyConfig,
    pub translate: TranslateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub max_pages: u32,
    pub pace_min_seconds: f64,
    pub pace_max_seconds: f64,
    pub output_dir: String,
    pub run_log: String,
    pub log_dir: String,
    /// Append each page's records as soon as the page is processed
    pub flush_each_page: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_pages: 30,
            pace_min_seconds: 1.0,
            pace_max_seconds: 3.0,
            output_dir: "data".to_string(),
            run_log: "data/run_log.txt".to_string(),
            log_dir: "logs".to_string(),
            flush_each_page: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Currency every converted price is expressed in
    pub target: String,
    pub rate_api_url: String,
    /// Rate used whenever the live lookup fails
    pub fallback_rate: f64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            target: "MAD".to_string(),
            rate_api_url: "https://api.exchangerate-api.com/v4/latest".to_string(),
            fallback_rate: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub endpoint: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://libretranslate.com/translate".to_string(),
            source_lang: "en".to_string(),
            target_lang: "fr".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults when no path is given.
    /// Environment overrides are applied afterwards in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    ScraperError::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(FALLBACK_RATE_ENV) {
            self.currency.fallback_rate = raw.trim().parse().map_err(|_| {
                ScraperError::Config(format!("{FALLBACK_RATE_ENV} is not a number: '{raw}'"))
            })?;
        }
        if let Ok(url) = std::env::var(RATE_API_URL_ENV) {
            if !url.trim().is_empty() {
                self.currency.rate_api_url = url.trim().to_string();
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let run = &self.run;
        if !is_valid_window(run.pace_min_seconds, run.pace_max_seconds) {
            return Err(ScraperError::Config(format!(
                "invalid pacing window [{}, {}]; bounds must satisfy 0 <= min <= max <= {}",
                run.pace_min_seconds, run.pace_max_seconds, MAX_PACE_SECONDS
            )));
        }
        if !(self.currency.fallback_rate.is_finite() && self.currency.fallback_rate > 0.0) {
            return Err(ScraperError::Config(format!(
                "fallback_rate must be positive, got {}",
                self.currency.fallback_rate
            )));
        }
        if self.currency.target.trim().is_empty() {
            return Err(ScraperError::Config("currency target is empty".to_string()));
        }
        Ok(())
    }
}
