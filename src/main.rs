use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info, warn};

use market_scraper::config::Config;
use market_scraper::infra::{HttpRateSource, LibreTranslateClient, ReqwestFetcher};
use market_scraper::logging;
use market_scraper::pipeline::pacing::{is_valid_window, MAX_PACE_SECONDS};
use market_scraper::pipeline::{Pipeline, RunOptions};
use market_scraper::{query, sources, translate};

#[derive(Parser)]
#[command(name = "market_scraper")]
#[command(about = "Marketplace product listing scraper")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl one source's listing pages into a CSV file
    Crawl {
        /// Source to crawl. See `sources` for the list
        #[arg(long)]
        source: String,
        /// Override the source's default first page
        #[arg(long)]
        start_url: Option<String>,
        /// CSV file to append to
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        max_pages: Option<u32>,
        /// Minimum pause between pages, in seconds
        #[arg(long)]
        pace_min: Option<f64>,
        /// Maximum pause between pages, in seconds
        #[arg(long)]
        pace_max: Option<f64>,
    },
    /// List the configured sources
    Sources,
    /// Translate one column of a CSV file into a sibling `_translated` file
    Translate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "productName")]
        column: String,
    },
    /// Find the cheapest listing matching a product name
    Lowest {
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        #[arg(long)]
        product: String,
    },
    /// Count listings per promotion
    Promotions {
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("invalid configuration")?;
    let _guard = logging::init_logging(&config.run.log_dir);

    match cli.command {
        Commands::Crawl {
            source,
            start_url,
            output,
            max_pages,
            pace_min,
            pace_max,
        } => {
            let profile = sources::find_profile(&source)?;
            let mut options = RunOptions::for_profile(profile, &config);
            if let Some(start_url) = start_url {
                options.start_url = start_url;
            }
            if let Some(output) = output {
                options.output = output;
            }
            if let Some(max_pages) = max_pages {
                options.max_pages = max_pages;
            }
            if let Some(pace_min) = pace_min {
                options.pace_min_seconds = pace_min;
            }
            if let Some(pace_max) = pace_max {
                options.pace_max_seconds = pace_max;
            }
            if !is_valid_window(options.pace_min_seconds, options.pace_max_seconds) {
                bail!(
                    "invalid pacing window [{}, {}]; bounds must satisfy 0 <= min <= max <= {}",
                    options.pace_min_seconds,
                    options.pace_max_seconds,
                    MAX_PACE_SECONDS
                );
            }

            println!("🔄 Crawling {} from {}", profile.name, options.start_url);
            let fetcher = ReqwestFetcher::new(&config.http, &options.start_url)?;
            let rates = HttpRateSource::new(&config.currency.rate_api_url, config.http.timeout_seconds)?;

            let (stop_tx, stop_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received; stopping after the current page");
                    println!("\n🛑 Stopping after the current page...");
                    let _ = stop_tx.send(true);
                }
            });

            let result = match Pipeline::run_source(
                profile,
                &options,
                &config.currency,
                Box::new(fetcher),
                &rates,
                Some(stop_rx),
            )
            .await
            {
                Ok(result) => result,
                Err(e) => {
                    error!("Crawl failed: {}", e);
                    return Err(e.into());
                }
            };

            println!("\n📊 Crawl Results for {}:", result.source);
            println!("   Pages: {}", result.pages);
            println!("   Records: {}", result.records_written);
            println!("   Ended by: {}", result.termination);
            println!("   Skipped items: {}", result.stats.items_skipped);
            println!("   Unparseable prices: {}", result.stats.unparseable_prices);
            if let Some(rate) = &result.exchange_rate {
                println!("   Rate {}->{}: {} ({:?})", rate.base, rate.quote, rate.rate, rate.origin);
            }
            println!("   Output file: {}", result.output_file);
        }
        Commands::Sources => {
            println!("📋 Available sources:");
            for profile in sources::profiles() {
                println!(
                    "   {:<14} {:<13} {:<32} {}",
                    profile.name,
                    profile.marketplace.to_string(),
                    profile.category,
                    profile.currency
                );
            }
        }
        Commands::Translate { input, column } => {
            println!("🌐 Translating column '{}' of {}", column, input.display());
            let translator = LibreTranslateClient::new(&config.translate);
            let summary = translate::translate_csv(&input, &column, &translator).await?;
            println!("✅ Translated {}/{} rows", summary.translated, summary.rows);
            if summary.failed > 0 {
                println!("⚠️  {} rows kept their original text", summary.failed);
            }
            println!("   Output file: {}", summary.output.display());
        }
        Commands::Lowest { input, product } => {
            let rows = query::load_catalog(&input)?;
            info!("Searching {} rows for '{}'", rows.len(), product);
            match query::lowest_price(&rows, &product) {
                Some((row, price)) => {
                    let field = |name: &str| row.get(name).map(String::as_str).unwrap_or("N/A");
                    println!("💰 Lowest price for '{}': {:.2}", product, price);
                    println!("   Product: {}", field("productName"));
                    println!("   Marketplace: {}", field("marketplace"));
                    println!("   Link: {}", field("link"));
                }
                None => println!("⚠️  No priced listing matches '{}'", product),
            }
        }
        Commands::Promotions { input } => {
            let rows = query::load_catalog(&input)?;
            println!("🏷️  Promotions across {} rows:", rows.len());
            for (promotion, count) in query::promotion_counts(&rows) {
                println!("   {:<12} {}", promotion, count);
            }
        }
    }

    Ok(())
}
