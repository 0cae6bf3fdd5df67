use super::{base_url, next_href, select_items, selector, SiteAdapter};
use crate::constants::JUMIA_BASE_URL;
use crate::error::Result;
use crate::pipeline::extract::{ItemLayout, Locator, PriceFormat, RawItemBlock};
use crate::types::Marketplace;
use reqwest::Url;
use scraper::{Html, Selector};

const PRICE_FORMAT: PriceFormat = PriceFormat::dot_decimal(&["Dhs", "DHS", "DH"]);

/// Jumia Morocco catalog pages. The same markup serves every category.
pub struct JumiaAdapter {
    base_url: Url,
    item: Selector,
    next: Selector,
    layout: ItemLayout,
    price_format: PriceFormat,
}

impl JumiaAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_url: base_url(JUMIA_BASE_URL)?,
            item: selector("div.info")?,
            next: selector(r#"a[aria-label="Page suivante"]"#)?,
            layout: ItemLayout {
                name: Locator::Text(selector("h3.name")?),
                // The whole card is wrapped in the product anchor.
                link: Locator::AncestorAttr {
                    tag: "a",
                    attr: "href",
                },
                price_initial: Locator::Text(selector("div.old")?),
                price_promo: Locator::Text(selector("div.prc")?),
                promotion: Some(selector("div.bdg._dsct._sm")?),
            },
            price_format: PRICE_FORMAT,
        })
    }
}

impl SiteAdapter for JumiaAdapter {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Jumia
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
