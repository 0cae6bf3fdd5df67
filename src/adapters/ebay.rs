use super::{base_url, next_href, select_items, selector, SiteAdapter};
use crate::constants::EBAY_BASE_URL;
use crate::error::Result;
use crate::pipeline::extract::{ItemLayout, Locator, PriceFormat, RawItemBlock};
use crate::types::Marketplace;
use reqwest::Url;
use scraper::{Html, Selector};

const PRICE_FORMAT: PriceFormat = PriceFormat::dot_decimal(&["US $", "US", "$"]);

/// eBay search results
pub struct EbayAdapter {
    base_url: Url,
    item: Selector,
    next: Selector,
    layout: ItemLayout,
    price_format: PriceFormat,
}

impl EbayAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_url: base_url(EBAY_BASE_URL)?,
            item: selector("li.s-item")?,
            next: selector("a.pagination__next")?,
            layout: ItemLayout {
                name: Locator::Text(selector("h3.s-item__title, div.s-item__title span")?),
                link: Locator::Attr {
                    selector: selector("a.s-item__link")?,
                    attr: "href",
                },
                price_initial: Locator::Text(selector("span.STRIKETHROUGH")?),
                price_promo: Locator::Text(selector("span.s-item__price")?),
                promotion: Some(selector("span.s-item__discount")?),
            },
            price_format: PRICE_FORMAT,
        })
    }
}

impl SiteAdapter for EbayAdapter {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Ebay
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
