use super::{base_url, next_href, select_items, selector, SiteAdapter};
use crate::constants::MARJANE_BASE_URL;
use crate::error::Result;
use crate::pipeline::extract::{ItemLayout, Locator, PriceFormat, RawItemBlock};
use crate::types::Marketplace;
use reqwest::Url;
use scraper::{Html, Selector};

// Prices are read from `data-price-amount`, which is already a plain decimal.
const PRICE_FORMAT: PriceFormat = PriceFormat::dot_decimal(&["MAD", "DH"]);

/// Marjane Mall category pages (Magento storefront)
pub struct MarjaneAdapter {
    base_url: Url,
    item: Selector,
    next: Selector,
    layout: ItemLayout,
    price_format: PriceFormat,
}

impl MarjaneAdapter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base_url: base_url(MARJANE_BASE_URL)?,
            item: selector("div.product-item-details")?,
            next: selector("li.item.pages-item-next a")?,
            layout: ItemLayout {
                name: Locator::Text(selector("a.product-item-link")?),
                link: Locator::Attr {
                    selector: selector("a.product-item-link")?,
                    attr: "href",
                },
                price_initial: Locator::Attr {
                    selector: selector("span.old-price.sly-old-price span.price-wrapper")?,
                    attr: "data-price-amount",
                },
                // First price wrapper of the block, which is the final price.
                price_promo: Locator::Attr {
                    selector: selector("span.price-wrapper")?,
                    attr: "data-price-amount",
                },
                promotion: None,
            },
            price_format: PRICE_FORMAT,
        })
    }
}

impl SiteAdapter for MarjaneAdapter {
    fn marketplace(&self) -> Marketplace {
        Marketplace::MarjaneMall
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
