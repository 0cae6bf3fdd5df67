use anyhow::Result;
use async_trait::async_trait;
use market_scraper::app::ports::{PageFetcher, RateSource};
use market_scraper::config::CurrencyConfig;
use market_scraper::error::ScraperError;
use market_scraper::pipeline::{Pipeline, RunOptions};
use market_scraper::sources::find_profile;
use market_scraper::types::{FetchedPage, RateOrigin, Termination};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

/// Serves `pages[n - 1]` for `...?page=n`; anything past the end fails.
struct ScriptedFetcher {
    pages: Vec<String>,
}

fn page_number(url: &str) -> usize {
    url.rsplit_once("page=")
        .and_then(|(_, n)| n.parse().ok())
        .unwrap_or(1)
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> market_scraper::error::Result<FetchedPage> {
        match self.pages.get(page_number(url) - 1) {
            Some(markup) => Ok(FetchedPage {
                status: 200,
                markup: markup.clone(),
            }),
            None => Err(ScraperError::Api {
                message: "connection reset by peer".to_string(),
            }),
        }
    }
}

/// Every page has items and a next link.
struct EndlessFetcher;

#[async_trait]
impl PageFetcher for EndlessFetcher {
    async fn fetch(&self, url: &str) -> market_scraper::error::Result<FetchedPage> {
        let n = page_number(url);
        Ok(FetchedPage {
            status: 200,
            markup: jumia_page(n, 2, true),
        })
    }
}

/// Counts fetches; every page is empty.
struct CountingFetcher(Arc<AtomicUsize>);

#[async_trait]
impl PageFetcher for CountingFetcher {
    async fn fetch(&self, _url: &str) -> market_scraper::error::Result<FetchedPage> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(FetchedPage {
            status: 200,
            markup: String::from("<html></html>"),
        })
    }
}

struct FixedRate(f64);

#[async_trait]
impl RateSource for FixedRate {
    async fn get_rate(&self, _base: &str, _quote: &str) -> market_scraper::error::Result<f64> {
        Ok(self.0)
    }
}

struct UnreachableRates;

#[async_trait]
impl RateSource for UnreachableRates {
    async fn get_rate(&self, _base: &str, _quote: &str) -> market_scraper::error::Result<f64> {
        Err(ScraperError::Api {
            message: "dns error".to_string(),
        })
    }
}

fn jumia_page(page: usize, items: usize, has_next: bool) -> String {
    let mut html = String::from("<html><body>");
    for i in 0..items {
        html.push_str(&format!(
            r#"<article><a href="/item-{page}-{i}.html"><div class="info">
                <h3 class="name">Frigo {page}-{i} 300L</h3>
                <div class="prc">1,999.00 Dhs</div><div class="old">2,499.00 Dhs</div>
            </div></a></article>"#
        ));
    }
    if has_next {
        html.push_str(&format!(
            r#"<a href="/refrigerateurs-frigo/?page={}" aria-label="Page suivante">&gt;</a>"#,
            page + 1
        ));
    }
    html.push_str("</body></html>");
    html
}

fn amazon_page() -> String {
    r#"<html><body>
    <div class="a-section a-spacing-small puis-padding-left-small puis-padding-right-small">
      <h2 class="a-size-base-plus a-spacing-none a-color-base a-text-normal"><span>Floral Wrap Dress</span></h2>
      <a class="a-link-normal s-line-clamp-4 s-link-style a-text-normal" href="/dp/B01">x</a>
      <span class="a-price"><span class="a-price-whole">20.</span></span>
      <span class="a-price a-text-price"><span class="a-offscreen">$25.50</span></span>
    </div>
    </body></html>"#
        .to_string()
}

fn options(dir: &Path, start_url: &str, max_pages: u32) -> RunOptions {
    RunOptions {
        start_url: start_url.to_string(),
        output: dir.join("out").join("products.csv"),
        max_pages,
        pace_min_seconds: 0.0,
        pace_max_seconds: 0.0,
        flush_each_page: true,
        run_log: Some(dir.join("run_log.txt")),
    }
}

fn csv_lines(path: &Path) -> Result<Vec<String>> {
    Ok(fs::read_to_string(path)?.lines().map(str::to_string).collect())
}

const JUMIA_START: &str = "https://www.jumia.ma/refrigerateurs-frigo/?page=1";

#[tokio::test]
async fn test_two_pages_then_no_next_page() -> Result<()> {
    let dir = tempdir()?;
    let profile = find_profile("jumia")?;
    let options = options(dir.path(), JUMIA_START, 30);
    let fetcher = ScriptedFetcher {
        pages: vec![jumia_page(1, 5, true), jumia_page(2, 3, false)],
    };

    let result = Pipeline::run_source(
        profile,
        &options,
        &CurrencyConfig::default(),
        Box::new(fetcher),
        &FixedRate(1.0),
        None,
    )
    .await?;

    assert_eq!(result.pages, 2);
    assert_eq!(result.records_written, 8);
    assert_eq!(result.termination, Termination::NoNextPage);
    // MAD source with a MAD target needs no rate.
    assert!(result.exchange_rate.is_none());

    let lines = csv_lines(&options.output)?;
    assert_eq!(lines.len(), 1 + 8);
    assert_eq!(
        lines[0],
        "productName,marketplace,category,link,priceInitial,pricePromo,collectionTime"
    );
    assert!(lines[1].starts_with("Frigo 1-0 300L,Jumia,Réfrigérateurs,https://www.jumia.ma/item-1-0.html,2499.00,1999.00,"));

    let run_log = fs::read_to_string(dir.path().join("run_log.txt"))?;
    assert_eq!(run_log.lines().count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_endless_listing_stops_at_page_cap() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), JUMIA_START, 3);

    let result = Pipeline::run_source(
        find_profile("jumia")?,
        &options,
        &CurrencyConfig::default(),
        Box::new(EndlessFetcher),
        &FixedRate(1.0),
        None,
    )
    .await?;

    assert_eq!(result.pages, 3);
    assert_eq!(result.records_written, 6);
    assert_eq!(result.termination, Termination::PageCapReached);
    Ok(())
}

#[tokio::test]
async fn test_empty_page_keeps_earlier_records() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), JUMIA_START, 30);
    let fetcher = ScriptedFetcher {
        pages: vec![jumia_page(1, 4, true), jumia_page(2, 0, true)],
    };

    let result = Pipeline::run_source(
        find_profile("jumia")?,
        &options,
        &CurrencyConfig::default(),
        Box::new(fetcher),
        &FixedRate(1.0),
        None,
    )
    .await?;

    assert_eq!(result.termination, Termination::EmptyPage);
    assert_eq!(result.pages, 1);
    assert_eq!(csv_lines(&options.output)?.len(), 1 + 4);
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_keeps_earlier_records() -> Result<()> {
    let dir = tempdir()?;
    let mut options = options(dir.path(), JUMIA_START, 30);
    options.flush_each_page = false;
    let fetcher = ScriptedFetcher {
        pages: vec![jumia_page(1, 2, true), jumia_page(2, 2, true)],
    };

    let result = Pipeline::run_source(
        find_profile("jumia")?,
        &options,
        &CurrencyConfig::default(),
        Box::new(fetcher),
        &FixedRate(1.0),
        None,
    )
    .await?;

    assert!(matches!(result.termination, Termination::FetchFailed(ref reason) if reason.contains("connection reset")));
    assert_eq!(result.pages, 2);
    assert_eq!(csv_lines(&options.output)?.len(), 1 + 4);
    Ok(())
}

#[tokio::test]
async fn test_rate_outage_falls_back_and_run_completes() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), "https://www.amazon.com/s?k=dress", 30);
    let currency = CurrencyConfig {
        fallback_rate: 10.0,
        ..CurrencyConfig::default()
    };
    let fetcher = ScriptedFetcher {
        pages: vec![amazon_page()],
    };

    let result = Pipeline::run_source(
        find_profile("amazon")?,
        &options,
        &currency,
        Box::new(fetcher),
        &UnreachableRates,
        None,
    )
    .await?;

    let rate = result.exchange_rate.expect("conversion runs for USD listings");
    assert_eq!(rate.origin, RateOrigin::Fallback);
    assert_eq!(rate.rate, 10.0);
    assert_eq!(result.termination, Termination::NoNextPage);

    let mut reader = csv::Reader::from_path(&options.output)?;
    let headers = reader.headers()?.clone();
    let row = reader.records().next().expect("one row")?;
    let column = |name: &str| headers.iter().position(|h| h == name).map(|i| row[i].to_string());
    assert_eq!(column("priceInitial").as_deref(), Some("25.50"));
    assert_eq!(column("priceInitialMAD").as_deref(), Some("255.00"));
    assert_eq!(column("pricePromoMAD").as_deref(), Some("200.00"));
    assert_eq!(column("link").as_deref(), Some("https://www.amazon.com/dp/B01"));
    Ok(())
}

#[tokio::test]
async fn test_live_rate_is_applied() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), "https://www.amazon.com/s?k=dress", 30);
    let fetcher = ScriptedFetcher {
        pages: vec![amazon_page()],
    };

    let result = Pipeline::run_source(
        find_profile("amazon")?,
        &options,
        &CurrencyConfig::default(),
        Box::new(fetcher),
        &FixedRate(9.5),
        None,
    )
    .await?;

    assert_eq!(result.exchange_rate.map(|r| r.origin), Some(RateOrigin::Live));
    let lines = csv_lines(&options.output)?;
    assert!(lines[1].contains(",242.25,190.00,"), "{}", lines[1]);
    Ok(())
}

#[tokio::test]
async fn test_second_run_appends_without_repeating_header() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), JUMIA_START, 30);

    for items in [3, 2] {
        let fetcher = ScriptedFetcher {
            pages: vec![jumia_page(1, items, false)],
        };
        Pipeline::run_source(
            find_profile("jumia")?,
            &options,
            &CurrencyConfig::default(),
            Box::new(fetcher),
            &FixedRate(1.0),
            None,
        )
        .await?;
    }

    let lines = csv_lines(&options.output)?;
    assert_eq!(lines.len(), 1 + 3 + 2);
    assert_eq!(lines.iter().filter(|l| l.starts_with("productName,")).count(), 1);

    let run_log = fs::read_to_string(dir.path().join("run_log.txt"))?;
    assert_eq!(run_log.lines().count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_laptop_profile_emits_promotions_and_attributes() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), "https://www.jumia.ma/pc-portables/?page=1", 30);
    let page = r#"<html><body><a href="/hp-840.html"><div class="info">
        <h3 class="name">HP EliteBook 840 G5 Core i5 8ème Génération 8Go 256Go SSD</h3>
        <div class="prc">3,499.00 Dhs</div><div class="old">4,200.00 Dhs</div>
        <div class="bdg _dsct _sm">17%</div>
    </div></a></body></html>"#;
    let fetcher = ScriptedFetcher {
        pages: vec![page.to_string()],
    };

    Pipeline::run_source(
        find_profile("jumia_laptops")?,
        &options,
        &CurrencyConfig::default(),
        Box::new(fetcher),
        &FixedRate(1.0),
        None,
    )
    .await?;

    let mut reader = csv::Reader::from_path(&options.output)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    assert_eq!(
        headers[6..],
        ["promotion", "collectionTime", "Brand", "Model", "Generation", "Processor", "RAM", "Storage"]
    );
    let row = reader.records().next().expect("one row")?;
    assert_eq!(&row[6], "17%");
    assert_eq!(&row[8], "HP");
    assert_eq!(&row[10], "8th Gen");
    assert_eq!(&row[12], "8GB");
    assert_eq!(&row[13], "256GB SSD");
    Ok(())
}

#[tokio::test]
async fn test_unwritable_destination_fails_before_fetching() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), JUMIA_START, 30);
    // A directory where the CSV file should be.
    fs::create_dir_all(&options.output)?;
    let fetches = Arc::new(AtomicUsize::new(0));

    let result = Pipeline::run_source(
        find_profile("jumia")?,
        &options,
        &CurrencyConfig::default(),
        Box::new(CountingFetcher(fetches.clone())),
        &FixedRate(1.0),
        None,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_without_records_leaves_no_file_behind() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), JUMIA_START, 30);
    let fetches = Arc::new(AtomicUsize::new(0));

    let result = Pipeline::run_source(
        find_profile("jumia")?,
        &options,
        &CurrencyConfig::default(),
        Box::new(CountingFetcher(fetches.clone())),
        &FixedRate(1.0),
        None,
    )
    .await?;

    assert_eq!(result.termination, Termination::EmptyPage);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(!options.output.exists());
    Ok(())
}
