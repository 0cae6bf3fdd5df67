//! Read-side queries over crawl output files.

use crate::constants::NO_PROMOTION;
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// One output row keyed by column name
pub type CatalogRow = HashMap<String, String>;

/// Load and concatenate the rows of several output files
pub fn load_catalog<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<CatalogRow>> {
    let mut rows = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;
        let before = rows.len();
        for row in reader.deserialize::<CatalogRow>() {
            rows.push(row?);
        }
        debug!("Loaded {} rows from {}", rows.len() - before, path.display());
    }
    Ok(rows)
}

fn numeric(row: &CatalogRow, column: &str) -> Option<f64> {
    row.get(column)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// The promo price when it is numeric, otherwise the initial price
pub fn effective_price(row: &CatalogRow) -> Option<f64> {
    numeric(row, "pricePromo").or_else(|| numeric(row, "priceInitial"))
}

/// Cheapest row whose product name contains `product`, ignoring case.
/// Ties go to the row loaded first.
pub fn lowest_price<'a>(rows: &'a [CatalogRow], product: &str) -> Option<(&'a CatalogRow, f64)> {
    let needle = product.to_lowercase();
    rows.iter()
        .filter(|row| {
            row.get("productName")
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .filter_map(|row| effective_price(row).map(|price| (row, price)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Number of rows per promotion value; rows without one count as `None`
pub fn promotion_counts(rows: &[CatalogRow]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        let promotion = row
            .get("promotion")
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .unwrap_or(NO_PROMOTION);
        *counts.entry(promotion.to_string()).or_insert(0) += 1;
    }
    counts
}
