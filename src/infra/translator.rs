use crate::app::ports::Translator;
use crate::config::TranslateConfig;
use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Client for a LibreTranslate-compatible `/translate` endpoint.
pub struct LibreTranslateClient {
    client: reqwest::Client,
    endpoint: String,
    source_lang: String,
    target_lang: String,
}

impl LibreTranslateClient {
    pub fn new(config: &TranslateConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
        }
    }
}

#[async_trait]
impl Translator for LibreTranslateClient {
    async fn translate(&self, text: &str) -> Result<String> {
        let body = json!({
            "q": text,
            "source": self.source_lang,
            "target": self.target_lang,
            "format": "text",
        });

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ScraperError::Api {
                message: format!("translation failed with status: {}", response.status()),
            });
        }

        let parsed: TranslateResponse = response.json().await?;
        Ok(parsed.translated_text)
    }
}
