//! Per-marketplace knowledge of listing page structure.

pub mod amazon;
pub mod cdiscount;
pub mod ebay;
pub mod jumia;
pub mod marjane;

use crate::error::{Result, ScraperError};
use crate::pipeline::extract::{resolve_link, ItemLayout, PriceFormat, RawItemBlock};
use crate::types::Marketplace;
use reqwest::Url;
use scraper::{Html, Selector};

pub use amazon::AmazonAdapter;
pub use cdiscount::CdiscountAdapter;
pub use ebay::EbayAdapter;
pub use jumia::JumiaAdapter;
pub use marjane::MarjaneAdapter;

/// Locates item blocks and the next-page reference of one marketplace's
/// listing pages, and declares where each field lives inside an item.
pub trait SiteAdapter: Send + Sync {
    fn marketplace(&self) -> Marketplace;

    /// Site root, used when the URL of the page at hand is unknown
    fn base_url(&self) -> &Url;

    fn layout(&self) -> &ItemLayout;

    fn price_format(&self) -> &PriceFormat;

    /// Item blocks in document order
    fn extract_items<'a>(&self, page: &'a Html) -> Vec<RawItemBlock<'a>>;

    /// Absolute URL of the next listing page, if the page links one.
    /// Relative references are resolved against `page_url`, the URL the page was fetched from.
    fn next_page_ref(&self, page: &Html, page_url: &Url) -> Option<String>;
}

/// Compile a CSS selector, reporting parse failures as configuration errors
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

pub fn base_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| ScraperError::Config(format!("invalid base URL '{url}': {e}")))
}

/// Every element matching `item` in document order
pub(crate) fn select_items<'a>(page: &'a Html, item: &Selector) -> Vec<RawItemBlock<'a>> {
    page.select(item).collect()
}

/// First `href` among elements matching `next`, resolved against `page_url`
pub(crate) fn next_href(page: &Html, next: &Selector, page_url: &Url) -> Option<String> {
    page.select(next)
        .find_map(|link| link.value().attr("href"))
        .and_then(|href| resolve_link(page_url, href))
}
