// Crawl pipeline: extraction, normalization, enrichment, and output

pub mod attributes;
pub mod crawl;
pub mod currency;
pub mod extract;
pub mod output;
pub mod pacing;
pub mod runner;

use crate::types::{Marketplace, NormalizedRecord};
use attributes::AttributeInferencer;
use chrono::NaiveDateTime;
use currency::CurrencyNormalizer;
use extract::ExtractedItem;

pub use crawl::CrawlController;
pub use runner::{Pipeline, PipelineResult, RunOptions};

/// Turns extracted items into canonical records for one source profile
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    marketplace: Marketplace,
    category: String,
    currency: Option<CurrencyNormalizer>,
    inferencer: Option<AttributeInferencer>,
}

impl RecordBuilder {
    pub fn new(marketplace: Marketplace, category: impl Into<String>) -> Self {
        Self {
            marketplace,
            category: category.into(),
            currency: None,
            inferencer: None,
        }
    }

    /// Mirror both prices into the normalizer's quote currency
    pub fn with_currency(mut self, normalizer: CurrencyNormalizer) -> Self {
        self.currency = Some(normalizer);
        self
    }

    pub fn with_attributes(mut self, inferencer: AttributeInferencer) -> Self {
        self.inferencer = Some(inferencer);
        self
    }

    pub fn build(&self, item: ExtractedItem, collection_time: NaiveDateTime) -> NormalizedRecord {
        let converted = self
            .currency
            .as_ref()
            .map(|normalizer| normalizer.mirror(item.price_initial, item.price_promo));
        let attributes = self.inferencer.as_ref().map(|inferencer| inferencer.infer(&item.name));

        NormalizedRecord {
            product_name: item.name,
            marketplace: self.marketplace,
            category: self.category.clone(),
            link: item.link,
            price_initial: item.price_initial,
            price_promo: item.price_promo,
            converted,
            promotion: item.promotion,
            collection_time,
            attributes,
        }
    }
}
