//! Per-item field extraction.
//!
//! Missing-value policy: an item without a name is skipped; a missing link
//! or price becomes the sentinel and the item is still emitted. Price text
//! that cannot be parsed is treated exactly like a missing price.

use crate::types::{ExtractionStats, Price};
use reqwest::Url;
use scraper::{ElementRef, Selector};
use tracing::debug;

/// One listing entry inside a parsed page
pub type RawItemBlock<'a> = ElementRef<'a>;

/// Locale rules for turning listing price text into an amount
#[derive(Debug, Clone, Copy)]
pub struct PriceFormat {
    pub currency_tokens: &'static [&'static str],
    pub thousands_separator: Option<char>,
    pub decimal_separator: char,
    /// A currency token between two digits separates the cents, as in `499€99`
    pub currency_as_decimal: bool,
}

impl PriceFormat {
    /// `1,234.56` style
    pub const fn dot_decimal(currency_tokens: &'static [&'static str]) -> Self {
        Self {
            currency_tokens,
            thousands_separator: Some(','),
            decimal_separator: '.',
            currency_as_decimal: false,
        }
    }

    /// `1.234,56` style
    pub const fn comma_decimal(currency_tokens: &'static [&'static str]) -> Self {
        Self {
            currency_tokens,
            thousands_separator: Some('.'),
            decimal_separator: ',',
            currency_as_decimal: false,
        }
    }

    pub const fn with_currency_as_decimal(self) -> Self {
        Self {
            currency_as_decimal: true,
            ..self
        }
    }

    pub fn parse(&self, text: &str) -> Option<f64> {
        let mut cleaned = text.trim().to_string();
        for token in self.currency_tokens {
            if self.currency_as_decimal && is_between_digits(&cleaned, token) {
                cleaned = cleaned.replacen(token, &self.decimal_separator.to_string(), 1);
            }
            cleaned = cleaned.replace(token, "");
        }

        let mut number = String::with_capacity(cleaned.len());
        for c in cleaned.chars() {
            if c.is_whitespace() || Some(c) == self.thousands_separator {
                continue;
            }
            if c == self.decimal_separator {
                number.push('.');
            } else {
                number.push(c);
            }
        }

        let value: f64 = number.parse().ok()?;
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

fn is_between_digits(text: &str, token: &str) -> bool {
    let Some(pos) = text.find(token) else {
        return false;
    };
    let before = text[..pos].chars().next_back();
    let after = text[pos + token.len()..].chars().next();
    matches!((before, after), (Some(b), Some(a)) if b.is_ascii_digit() && a.is_ascii_digit())
}

/// Where a field lives inside an item block
#[derive(Debug, Clone)]
pub enum Locator {
    /// Whitespace-collapsed text of the first matching descendant
    Text(Selector),
    /// Attribute of the first matching descendant
    Attr {
        selector: Selector,
        attr: &'static str,
    },
    /// Attribute of the nearest enclosing element with the given tag
    AncestorAttr {
        tag: &'static str,
        attr: &'static str,
    },
}

impl Locator {
    pub fn locate(&self, item: &ElementRef) -> Option<String> {
        let value = match self {
            Locator::Text(selector) => item.select(selector).next().map(|e| element_text(&e)),
            Locator::Attr { selector, attr } => item
                .select(selector)
                .find_map(|e| e.value().attr(attr))
                .map(str::to_string),
            Locator::AncestorAttr { tag, attr } => item
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == *tag)
                .and_then(|e| e.value().attr(attr))
                .map(str::to_string),
        };
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Text content of an element with runs of whitespace collapsed
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(|chunk| chunk.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Field locators of one source's listing entries
#[derive(Debug, Clone)]
pub struct ItemLayout {
    pub name: Locator,
    pub link: Locator,
    pub price_initial: Locator,
    pub price_promo: Locator,
    /// Promotion badges, when the source shows them
    pub promotion: Option<Selector>,
}

/// Fields pulled out of one item before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedItem {
    pub name: String,
    pub link: Option<String>,
    pub price_initial: Price,
    pub price_promo: Price,
    pub promotion: Option<String>,
}

/// Reads the fields of item blocks found on the page at `page_url`
pub struct FieldExtractor<'a> {
    layout: &'a ItemLayout,
    format: &'a PriceFormat,
    page_url: &'a Url,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(layout: &'a ItemLayout, format: &'a PriceFormat, page_url: &'a Url) -> Self {
        Self {
            layout,
            format,
            page_url,
        }
    }

    /// Extract one item, or `None` when it has no name.
    pub fn extract(&self, item: &RawItemBlock, stats: &mut ExtractionStats) -> Option<ExtractedItem> {
        stats.items_seen += 1;

        let Some(name) = self.layout.name.locate(item) else {
            stats.items_skipped += 1;
            debug!("Skipping item without a product name");
            return None;
        };

        let link = self
            .layout
            .link
            .locate(item)
            .and_then(|href| resolve_link(self.page_url, &href));
        if link.is_none() {
            stats.missing_link += 1;
            debug!("No link for '{}'", name);
        }

        let price_initial = self.price(&self.layout.price_initial, item, &name, stats);
        if price_initial == Price::Missing {
            stats.missing_price_initial += 1;
        }
        let price_promo = self.price(&self.layout.price_promo, item, &name, stats);
        if price_promo == Price::Missing {
            stats.missing_price_promo += 1;
        }

        let promotion = self.layout.promotion.as_ref().and_then(|selector| {
            let badges: Vec<String> = item
                .select(selector)
                .map(|badge| element_text(&badge))
                .filter(|text| !text.is_empty())
                .collect();
            (!badges.is_empty()).then(|| badges.join(", "))
        });

        Some(ExtractedItem {
            name,
            link,
            price_initial,
            price_promo,
            promotion,
        })
    }

    fn price(&self, locator: &Locator, item: &ElementRef, name: &str, stats: &mut ExtractionStats) -> Price {
        let Some(text) = locator.locate(item) else {
            return Price::Missing;
        };
        match self.format.parse(&text) {
            Some(amount) => Price::Amount(amount),
            None => {
                stats.unparseable_prices += 1;
                debug!("Unparseable price '{}' for '{}'", text, name);
                Price::Missing
            }
        }
    }
}

/// Resolve a possibly relative href against the URL of the page it appeared on
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|url| url.to_string())
}
