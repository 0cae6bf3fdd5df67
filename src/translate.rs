use crate::app::ports::Translator;
use crate::error::{Result, ScraperError};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Outcome of translating one column of a CSV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSummary {
    pub output: PathBuf,
    pub rows: usize,
    pub translated: usize,
    pub failed: usize,
}

/// `data/products.csv` -> `data/products_translated.csv`
pub fn translated_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}_translated.{}", stem, ext.to_string_lossy()),
        None => format!("{stem}_translated"),
    };
    input.with_file_name(name)
}

/// Rewrite `column` of `input` through `translator` into a sibling file.
/// A row whose translation fails keeps its original text.
#[instrument(skip(translator))]
pub async fn translate_csv(input: &Path, column: &str, translator: &dyn Translator) -> Result<TranslationSummary> {
    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();
    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| ScraperError::MissingColumn(column.to_string()))?;

    let output = translated_path(input);
    let mut writer = csv::Writer::from_path(&output)?;
    writer.write_record(&headers)?;

    let mut summary = TranslationSummary {
        output: output.clone(),
        rows: 0,
        translated: 0,
        failed: 0,
    };
    for record in reader.records() {
        let record = record?;
        summary.rows += 1;

        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
        if let Some(text) = fields.get(index).filter(|t| !t.trim().is_empty()).cloned() {
            match translator.translate(&text).await {
                Ok(translated) => {
                    fields[index] = translated;
                    summary.translated += 1;
                }
                Err(e) => {
                    warn!("Translation failed for '{}': {}; keeping original", text, e);
                    summary.failed += 1;
                }
            }
        }
        writer.write_record(&fields)?;
    }
    writer.flush()?;

    info!(
        "Translated {}/{} rows of {} into {}",
        summary.translated,
        summary.rows,
        input.display(),
        output.display()
    );
    Ok(summary)
}
