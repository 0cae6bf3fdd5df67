use crate::constants::{NO_PROMOTION, SENTINEL};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Pointer to the next listing page to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub url: String,
    pub index: u32,
}

/// Raw response of one page fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub markup: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Marketplace {
    Amazon,
    Jumia,
    MarjaneMall,
    Ebay,
    Cdiscount,
}

impl Marketplace {
    pub fn display_name(&self) -> &'static str {
        match self {
            Marketplace::Amazon => "Amazon",
            Marketplace::Jumia => "Jumia",
            Marketplace::MarjaneMall => "Marjane Mall",
            Marketplace::Ebay => "eBay",
            Marketplace::Cdiscount => "Cdiscount",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A price that is either a parsed amount or the sentinel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Price {
    Amount(f64),
    Missing,
}

impl Price {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Amount(value) => Some(*value),
            Price::Missing => None,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Price {
        match self {
            Price::Amount(value) => Price::Amount(f(value)),
            Price::Missing => Price::Missing,
        }
    }
}

impl From<Option<f64>> for Price {
    fn from(value: Option<f64>) -> Self {
        value.map(Price::Amount).unwrap_or(Price::Missing)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Amount(value) => write!(f, "{value:.2}"),
            Price::Missing => f.write_str(SENTINEL),
        }
    }
}

/// Structured attributes inferred from a product name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Facet {
    Brand,
    Model,
    Generation,
    Processor,
    Memory,
    Storage,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Brand,
        Facet::Model,
        Facet::Generation,
        Facet::Processor,
        Facet::Memory,
        Facet::Storage,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            Facet::Brand => "Brand",
            Facet::Model => "Model",
            Facet::Generation => "Generation",
            Facet::Processor => "Processor",
            Facet::Memory => "RAM",
            Facet::Storage => "Storage",
        }
    }
}

pub type Attributes = BTreeMap<Facet, String>;

/// Prices mirrored into the run's target currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedPrices {
    pub currency: String,
    pub price_initial: Price,
    pub price_promo: Price,
}

/// One product listing in canonical form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub product_name: String,
    pub marketplace: Marketplace,
    pub category: String,
    pub link: Option<String>,
    pub price_initial: Price,
    pub price_promo: Price,
    pub converted: Option<ConvertedPrices>,
    pub promotion: Option<String>,
    pub collection_time: NaiveDateTime,
    pub attributes: Option<Attributes>,
}

impl NormalizedRecord {
    pub fn link_or_sentinel(&self) -> &str {
        self.link.as_deref().unwrap_or(SENTINEL)
    }

    pub fn promotion_or_none(&self) -> &str {
        self.promotion.as_deref().unwrap_or(NO_PROMOTION)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateOrigin {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    pub base: String,
    pub quote: String,
    pub rate: f64,
    pub fetched_at: DateTime<Local>,
    pub origin: RateOrigin,
}

/// Why a crawl loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Termination {
    NoNextPage,
    EmptyPage,
    FetchFailed(String),
    PageCapReached,
    Stopped,
}

impl Termination {
    /// Stable label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Termination::NoNextPage => "no_next_page",
            Termination::EmptyPage => "empty_page",
            Termination::FetchFailed(_) => "fetch_failed",
            Termination::PageCapReached => "page_cap_reached",
            Termination::Stopped => "stopped",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Counters for items and fields lost to the extraction policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub items_seen: usize,
    pub items_skipped: usize,
    pub missing_link: usize,
    pub missing_price_initial: usize,
    pub missing_price_promo: usize,
    pub unparseable_prices: usize,
}

impl ExtractionStats {
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.items_seen += other.items_seen;
        self.items_skipped += other.items_skipped;
        self.missing_link += other.missing_link;
        self.missing_price_initial += other.missing_price_initial;
        self.missing_price_promo += other.missing_price_promo;
        self.unparseable_prices += other.unparseable_prices;
    }
}

/// Process-scoped state of one crawl
#[derive(Debug)]
pub struct CrawlSession {
    pub page_count: u32,
    pub max_pages: u32,
    pub collected: Vec<NormalizedRecord>,
    pub cursor: Option<PageCursor>,
    pub stats: ExtractionStats,
}

impl CrawlSession {
    pub fn new(start_url: &str, max_pages: u32) -> Self {
        Self {
            page_count: 0,
            max_pages,
            collected: Vec::new(),
            cursor: Some(PageCursor {
                url: start_url.to_string(),
                index: 0,
            }),
            stats: ExtractionStats::default(),
        }
    }

    pub fn cap_reached(&self) -> bool {
        self.page_count >= self.max_pages
    }
}

/// Outcome of a finished crawl
#[derive(Debug, Serialize)]
pub struct CrawlReport {
    pub records: Vec<NormalizedRecord>,
    pub pages: u32,
    pub termination: Termination,
    pub stats: ExtractionStats,
}
