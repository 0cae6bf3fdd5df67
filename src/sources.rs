use crate::adapters::{AmazonAdapter, CdiscountAdapter, EbayAdapter, JumiaAdapter, MarjaneAdapter, SiteAdapter};
use crate::constants::*;
use crate::error::{Result, ScraperError};
use crate::pipeline::output::RecordSchema;
use crate::types::Marketplace;
use std::path::{Path, PathBuf};

/// Everything that varies between two configured crawl targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProfile {
    pub name: &'static str,
    pub marketplace: Marketplace,
    pub category: &'static str,
    /// Currency the listing prices are quoted in
    pub currency: &'static str,
    pub start_url: &'static str,
    pub infer_attributes: bool,
    pub promotions: bool,
}

const PROFILES: &[SourceProfile] = &[
    SourceProfile {
        name: AMAZON_SOURCE,
        marketplace: Marketplace::Amazon,
        category: "Mode, Vêtements et Accessoires",
        currency: "USD",
        start_url: AMAZON_START_URL,
        infer_attributes: false,
        promotions: false,
    },
    SourceProfile {
        name: JUMIA_SOURCE,
        marketplace: Marketplace::Jumia,
        category: "Réfrigérateurs",
        currency: "MAD",
        start_url: JUMIA_START_URL,
        infer_attributes: false,
        promotions: false,
    },
    SourceProfile {
        name: JUMIA_LAPTOPS_SOURCE,
        marketplace: Marketplace::Jumia,
        category: "PC Portables",
        currency: "MAD",
        start_url: JUMIA_LAPTOPS_START_URL,
        infer_attributes: true,
        promotions: true,
    },
    SourceProfile {
        name: MARJANE_SOURCE,
        marketplace: Marketplace::MarjaneMall,
        category: "Clothing, Shoes & Jewelry",
        currency: "MAD",
        start_url: MARJANE_START_URL,
        infer_attributes: false,
        promotions: false,
    },
    SourceProfile {
        name: EBAY_SOURCE,
        marketplace: Marketplace::Ebay,
        category: "Électronique",
        currency: "USD",
        start_url: EBAY_START_URL,
        infer_attributes: true,
        promotions: true,
    },
    SourceProfile {
        name: CDISCOUNT_SOURCE,
        marketplace: Marketplace::Cdiscount,
        category: "Électronique",
        currency: "EUR",
        start_url: CDISCOUNT_START_URL,
        infer_attributes: true,
        promotions: false,
    },
];

/// All configured crawl targets, in CLI listing order
pub fn profiles() -> &'static [SourceProfile] {
    PROFILES
}

pub fn find_profile(name: &str) -> Result<&'static SourceProfile> {
    PROFILES.iter().find(|p| p.name == name).ok_or_else(|| {
        ScraperError::Config(format!(
            "Unknown source '{}'. Available: {}",
            name,
            get_supported_sources().join(", ")
        ))
    })
}

/// Build the adapter for a source name
pub fn create_adapter(name: &str) -> Result<Box<dyn SiteAdapter>> {
    match name {
        AMAZON_SOURCE => Ok(Box::new(AmazonAdapter::new()?)),
        JUMIA_SOURCE | JUMIA_LAPTOPS_SOURCE => Ok(Box::new(JumiaAdapter::new()?)),
        MARJANE_SOURCE => Ok(Box::new(MarjaneAdapter::new()?)),
        EBAY_SOURCE => Ok(Box::new(EbayAdapter::new()?)),
        CDISCOUNT_SOURCE => Ok(Box::new(CdiscountAdapter::new()?)),
        _ => Err(ScraperError::Config(format!("No adapter for source '{name}'"))),
    }
}

impl SourceProfile {
    pub fn create_adapter(&self) -> Result<Box<dyn SiteAdapter>> {
        create_adapter(self.name)
    }

    /// Conversion only runs when prices are not already in the target currency
    pub fn needs_conversion(&self, target_currency: &str) -> bool {
        !self.currency.eq_ignore_ascii_case(target_currency)
    }

    pub fn schema(&self, target_currency: &str) -> RecordSchema {
        RecordSchema {
            converted_currency: self
                .needs_conversion(target_currency)
                .then(|| target_currency.to_string()),
            promotions: self.promotions,
            attributes: self.infer_attributes,
        }
    }

    pub fn default_output(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}_products.csv", self.name))
    }
}
