use crate::app::ports::{PageFetcher, RateSource};
use crate::config::{Config, CurrencyConfig};
use crate::error::Result;
use crate::logging::record_run_start;
use crate::pipeline::attributes::AttributeInferencer;
use crate::pipeline::crawl::CrawlController;
use crate::pipeline::currency::CurrencyNormalizer;
use crate::pipeline::output::CsvSink;
use crate::pipeline::pacing::JitteredPacer;
use crate::pipeline::RecordBuilder;
use crate::sources::SourceProfile;
use crate::types::{ExchangeRate, ExtractionStats, Termination};
use metrics::{counter, histogram};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Knobs of one crawl run, after CLI flags were merged over the config file
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub start_url: String,
    pub output: PathBuf,
    pub max_pages: u32,
    pub pace_min_seconds: f64,
    pub pace_max_seconds: f64,
    pub flush_each_page: bool,
    pub run_log: Option<PathBuf>,
}

impl RunOptions {
    pub fn for_profile(profile: &SourceProfile, config: &Config) -> Self {
        Self {
            start_url: profile.start_url.to_string(),
            output: profile.default_output(Path::new(&config.run.output_dir)),
            max_pages: config.run.max_pages,
            pace_min_seconds: config.run.pace_min_seconds,
            pace_max_seconds: config.run.pace_max_seconds,
            flush_each_page: config.run.flush_each_page,
            run_log: Some(PathBuf::from(&config.run.run_log)),
        }
    }
}

/// Result of a complete crawl run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub run_id: String,
    pub source: String,
    pub pages: u32,
    pub records_written: usize,
    pub termination: Termination,
    pub stats: ExtractionStats,
    pub output_file: String,
    pub exchange_rate: Option<ExchangeRate>,
}

pub struct Pipeline;

impl Pipeline {
    /// Run one source end to end: run log, rate resolution, crawl, output.
    #[instrument(skip_all, fields(source = %profile.name))]
    pub async fn run_source(
        profile: &SourceProfile,
        options: &RunOptions,
        currency: &CurrencyConfig,
        fetcher: Box<dyn PageFetcher>,
        rates: &dyn RateSource,
        stop: Option<watch::Receiver<bool>>,
    ) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, "🚀 Starting crawl for {}", profile.name);
        counter!("market_scraper_runs_total", "source" => profile.name).increment(1);
        let t_run = std::time::Instant::now();

        if let Some(run_log) = &options.run_log {
            if let Err(e) = record_run_start(run_log) {
                warn!("Could not append to run log {}: {}", run_log.display(), e);
            }
        }

        // Fail before any network work when the destination is unreachable.
        if let Some(parent) = options.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let output_existed = options.output.exists();
        OpenOptions::new().create(true).append(true).open(&options.output)?;

        let mut builder = RecordBuilder::new(profile.marketplace, profile.category);
        let mut exchange_rate = None;
        if profile.needs_conversion(&currency.target) {
            let normalizer =
                CurrencyNormalizer::resolve(rates, profile.currency, &currency.target, currency.fallback_rate).await;
            exchange_rate = Some(normalizer.rate().clone());
            builder = builder.with_currency(normalizer);
        }
        if profile.infer_attributes {
            builder = builder.with_attributes(AttributeInferencer::laptops()?);
        }

        let sink = CsvSink::new(profile.schema(&currency.target));
        let mut controller = CrawlController::new(profile.create_adapter()?, fetcher, builder)
            .with_pacer(JitteredPacer::from_secs_f64(options.pace_min_seconds, options.pace_max_seconds));
        if options.flush_each_page {
            controller = controller.with_sink(sink.clone(), options.output.clone());
        }
        if let Some(stop) = stop {
            controller = controller.with_stop_signal(stop);
        }

        let report = controller.run(&options.start_url, options.max_pages).await?;
        drop(controller);

        if !options.flush_each_page && !report.records.is_empty() {
            sink.append(&report.records, &options.output)?;
        }
        if report.records.is_empty() {
            if !output_existed {
                let _ = fs::remove_file(&options.output);
            }
            info!("No records collected; {} left untouched", options.output.display());
        }

        histogram!("market_scraper_run_duration_seconds", "source" => profile.name)
            .record(t_run.elapsed().as_secs_f64());
        info!(
            "✅ Crawl for {} finished: {} records from {} pages ({})",
            profile.name,
            report.records.len(),
            report.pages,
            report.termination
        );

        Ok(PipelineResult {
            run_id,
            source: profile.name.to_string(),
            pages: report.pages,
            records_written: report.records.len(),
            termination: report.termination,
            stats: report.stats,
            output_file: options.output.display().to_string(),
            exchange_rate,
        })
    }
}
