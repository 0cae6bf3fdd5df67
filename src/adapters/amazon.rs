use super::{base_url, next_href, select_items, selector, SiteAdapter};
use crate::constants::AMAZON_BASE_URL;
use crate::error::Result;
use crate::pipeline::extract::{ItemLayout, Locator, PriceFormat, RawItemBlock};
use crate::types::Marketplace;
use reqwest::Url;
use scraper::{Html, Selector};

const PRICE_FORMAT: PriceFormat = PriceFormat::dot_decimal(&["US$", "USD", "$"]);

/// Amazon search result grid
pub struct AmazonAdapter {
    base_url: Url,
    item: Selector,
    next: Selector,
    layout: ItemLayout,
    price_format: PriceFormat,
}

impl AmazonAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_url: base_url(AMAZON_BASE_URL)?,
            item: selector("div.a-section.a-spacing-small.puis-padding-left-small.puis-padding-right-small")?,
            next: selector("a.s-pagination-item.s-pagination-next")?,
            layout: ItemLayout {
                name: Locator::Text(selector(
                    "h2.a-size-base-plus.a-spacing-none.a-color-base.a-text-normal span",
                )?),
                link: Locator::Attr {
                    selector: selector("a.a-link-normal.s-line-clamp-4.s-link-style.a-text-normal")?,
                    attr: "href",
                },
                // Struck-through list price; the whole-unit price is the one charged.
                price_initial: Locator::Text(selector("span.a-price.a-text-price span.a-offscreen")?),
                price_promo: Locator::Text(selector("span.a-price-whole")?),
                promotion: None,
            },
            price_format: PRICE_FORMAT,
        })
    }
}

impl SiteAdapter for AmazonAdapter {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Amazon
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn layout(&self) -> &ItemLayout {
        &self.layout
    }

    fn price_format(&self) -> &PriceFormat {
        &self.price_format
    }

    fn extract_items<'a>(&self, page: &'a Html) -> Vec<RawItemBlock<'a>> {
        select_items(page, &self.item)
    }

    fn next_page_ref(&self, page: &Html, page_url: &Url) -> Option<String> {
        next_href(page, &self.next, page_url)
    }
}
