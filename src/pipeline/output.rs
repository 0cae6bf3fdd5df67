use crate::constants::{COLLECTION_TIME_FORMAT, UNKNOWN};
use crate::error::Result;
use crate::types::{Facet, NormalizedRecord};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Column layout of one output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    /// Currency of the converted price mirrors, when conversion is on
    pub converted_currency: Option<String>,
    pub promotions: bool,
    pub attributes: bool,
}

impl RecordSchema {
    pub fn header(&self) -> Vec<String> {
        let mut columns: Vec<String> = ["productName", "marketplace", "category", "link", "priceInitial", "pricePromo"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        if let Some(currency) = &self.converted_currency {
            columns.push(format!("priceInitial{currency}"));
            columns.push(format!("pricePromo{currency}"));
        }
        if self.promotions {
            columns.push("promotion".to_string());
        }
        columns.push("collectionTime".to_string());
        if self.attributes {
            columns.extend(Facet::ALL.iter().map(|f| f.column_name().to_string()));
        }
        columns
    }

    pub fn row(&self, record: &NormalizedRecord) -> Vec<String> {
        let mut row = vec![
            record.product_name.clone(),
            record.marketplace.to_string(),
            record.category.clone(),
            record.link_or_sentinel().to_string(),
            record.price_initial.to_string(),
            record.price_promo.to_string(),
        ];
        if self.converted_currency.is_some() {
            match &record.converted {
                Some(converted) => {
                    row.push(converted.price_initial.to_string());
                    row.push(converted.price_promo.to_string());
                }
                None => {
                    row.push(crate::constants::SENTINEL.to_string());
                    row.push(crate::constants::SENTINEL.to_string());
                }
            }
        }
        if self.promotions {
            row.push(record.promotion_or_none().to_string());
        }
        row.push(record.collection_time.format(COLLECTION_TIME_FORMAT).to_string());
        if self.attributes {
            for facet in Facet::ALL {
                let value = record
                    .attributes
                    .as_ref()
                    .and_then(|attrs| attrs.get(&facet))
                    .map(String::as_str)
                    .unwrap_or(UNKNOWN);
                row.push(value.to_string());
            }
        }
        row
    }
}

/// Appends records to a CSV file, writing the header only when the file is new.
#[derive(Debug, Clone)]
pub struct CsvSink {
    schema: RecordSchema,
}

impl CsvSink {
    pub fn new(schema: RecordSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Append `records` to `destination`. Existing rows are never rewritten.
    pub fn append(&self, records: &[NormalizedRecord], destination: &Path) -> Result<usize> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let header = self.schema.header();
        let is_new = fs::metadata(destination).map(|m| m.len() == 0).unwrap_or(true);
        if !is_new {
            self.check_existing_header(destination, &header);
        }

        let mut file = OpenOptions::new().create(true).append(true).open(destination)?;
        if !is_new && !ends_with_newline(destination)? {
            // An interrupted write left a partial last row; keep new rows off that line.
            warn!("{} does not end with a newline; terminating its last row", destination.display());
            file.write_all(b"\n")?;
        }
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if is_new {
            writer.write_record(&header)?;
            info!("Created {} with {} columns", destination.display(), header.len());
        }
        for record in records {
            writer.write_record(self.schema.row(record))?;
        }
        writer.flush()?;

        debug!("Appended {} rows to {}", records.len(), destination.display());
        Ok(records.len())
    }

    fn check_existing_header(&self, destination: &Path, expected: &[String]) {
        let Ok(file) = fs::File::open(destination) else {
            return;
        };
        let mut first_line = String::new();
        if BufReader::new(file).read_line(&mut first_line).is_err() {
            return;
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(first_line.as_bytes());
        if let Some(Ok(existing)) = reader.records().next() {
            let matches = existing.iter().eq(expected.iter().map(String::as_str));
            if !matches {
                warn!(
                    "Existing header of {} differs from the current schema; appending anyway",
                    destination.display()
                );
            }
        }
    }
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = fs::File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
