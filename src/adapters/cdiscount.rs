use super::{base_url, next_href, select_items, selector, SiteAdapter};
use crate::constants::CDISCOUNT_BASE_URL;
use crate::error::Result;
use crate::pipeline::extract::{ItemLayout, Locator, PriceFormat, RawItemBlock};
use crate::types::Marketplace;
use reqwest::Url;
use scraper::{Html, Selector};

/// French locale: `1.299,99 €`, and the euro sign doubles as the decimal mark in `499€99`.
const PRICE_FORMAT: PriceFormat = PriceFormat::comma_decimal(&["€", "EUR"]).with_currency_as_decimal();

/// Cdiscount search results
pub struct CdiscountAdapter {
    base_url: Url,
    item: Selector,
    next: Selector,
    layout: ItemLayout,
    price_format: PriceFormat,
}

impl CdiscountAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_url: base_url(CDISCOUNT_BASE_URL)?,
            item: selector("div.prdtBloc")?,
            next: selector(r#"a[rel="next"]"#)?,
            layout: ItemLayout {
                name: Locator::Text(selector("div.prdtBILTit, h2.prdtTit")?),
                link: Locator::Attr {
                    selector: selector("a[href]")?,
                    attr: "href",
                },
                price_initial: Locator::Text(selector("div.prdtPrSt")?),
                price_promo: Locator::Text(selector("span.price")?),
                promotion: None,
            },
            price_format: PRICE_FORMAT,
        })
    }
}

impl SiteAdapter for CdiscountAdapter {
    fn marketplace(&self) -> Marketplace {
        Marketplace::Cdiscount
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
