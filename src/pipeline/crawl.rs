use crate::adapters::SiteAdapter;
use crate::app::ports::PageFetcher;
use crate::error::Result;
use crate::pipeline::extract::FieldExtractor;
use crate::pipeline::output::CsvSink;
use crate::pipeline::pacing::{NoPacing, Pacer};
use crate::pipeline::RecordBuilder;
use crate::types::{CrawlReport, CrawlSession, ExtractionStats, NormalizedRecord, PageCursor, Termination};
use chrono::{Local, NaiveDateTime};
use metrics::{counter, histogram};
use reqwest::Url;
use scraper::Html;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// What one processed page produced
#[derive(Debug)]
pub struct PageOutcome {
    pub records: Vec<NormalizedRecord>,
    pub next_page: Option<String>,
    pub stats: ExtractionStats,
}

/// Drives one paginated crawl: fetch, extract, normalize, advance, pause.
pub struct CrawlController {
    adapter: Box<dyn SiteAdapter>,
    fetcher: Box<dyn PageFetcher>,
    builder: RecordBuilder,
    pacer: Box<dyn Pacer>,
    sink: Option<(CsvSink, PathBuf)>,
    stop: Option<watch::Receiver<bool>>,
}

impl CrawlController {
    pub fn new(adapter: Box<dyn SiteAdapter>, fetcher: Box<dyn PageFetcher>, builder: RecordBuilder) -> Self {
        Self {
            adapter,
            fetcher,
            builder,
            pacer: Box::new(NoPacing),
            sink: None,
            stop: None,
        }
    }

    pub fn with_pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Box::new(pacer);
        self
    }

    /// Append every page's records to `destination` as soon as the page is processed
    pub fn with_sink(mut self, sink: CsvSink, destination: impl Into<PathBuf>) -> Self {
        self.sink = Some((sink, destination.into()));
        self
    }

    /// Stop cooperatively once the receiver observes `true`
    pub fn with_stop_signal(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Crawl from `start_url` for at most `max_pages` pages.
    ///
    /// Every termination mode returns the records collected so far. Only a
    /// failing sink aborts the run with an error.
    #[instrument(skip(self), fields(marketplace = %self.adapter.marketplace()))]
    pub async fn run(&self, start_url: &str, max_pages: u32) -> Result<CrawlReport> {
        let mut session = CrawlSession::new(start_url, max_pages);
        let source = self.adapter.marketplace().display_name();

        let termination = loop {
            let Some(cursor) = session.cursor.clone() else {
                break Termination::NoNextPage;
            };
            if session.cap_reached() {
                break Termination::PageCapReached;
            }
            if self.stop_requested() {
                break Termination::Stopped;
            }

            info!("📡 Fetching page {} from {}", cursor.index + 1, cursor.url);
            let t_fetch = std::time::Instant::now();
            let page = match self.fetcher.fetch(&cursor.url).await {
                Ok(page) if page.is_success() => page,
                Ok(page) => break Termination::FetchFailed(format!("HTTP status {}", page.status)),
                Err(e) => break Termination::FetchFailed(e.to_string()),
            };
            histogram!("market_scraper_fetch_duration_seconds", "source" => source)
                .record(t_fetch.elapsed().as_secs_f64());

            let outcome = self.process_page(&page.markup, &cursor.url, Local::now().naive_local());
            session.stats.merge(&outcome.stats);
            if outcome.records.is_empty() {
                break Termination::EmptyPage;
            }

            info!(
                "✅ Page {}: {} records ({} items seen, {} skipped)",
                cursor.index + 1,
                outcome.records.len(),
                outcome.stats.items_seen,
                outcome.stats.items_skipped
            );
            counter!("market_scraper_records_total", "source" => source).increment(outcome.records.len() as u64);

            if let Some((sink, destination)) = &self.sink {
                sink.append(&outcome.records, destination)?;
            }
            session.collected.extend(outcome.records);
            session.page_count += 1;
            session.cursor = outcome.next_page.map(|url| PageCursor {
                url,
                index: cursor.index + 1,
            });

            if session.cursor.is_some() && !session.cap_reached() && self.pause().await {
                break Termination::Stopped;
            }
        };

        self.log_termination(&termination, &session);
        counter!("market_scraper_crawl_terminations_total", "reason" => termination.label()).increment(1);

        Ok(CrawlReport {
            records: session.collected,
            pages: session.page_count,
            termination,
            stats: session.stats,
        })
    }

    /// Extract and normalize one page of markup fetched from `page_url`.
    /// Relative links resolve against that URL. The parsed document never
    /// outlives this call.
    pub fn process_page(&self, markup: &str, page_url: &str, collected_at: NaiveDateTime) -> PageOutcome {
        let page_url = Url::parse(page_url).unwrap_or_else(|e| {
            debug!("Unparseable page URL '{}' ({}); resolving links against the site root", page_url, e);
            self.adapter.base_url().clone()
        });
        let document = Html::parse_document(markup);
        let extractor = FieldExtractor::new(self.adapter.layout(), self.adapter.price_format(), &page_url);

        let mut stats = ExtractionStats::default();
        let records = self
            .adapter
            .extract_items(&document)
            .iter()
            .filter_map(|item| extractor.extract(item, &mut stats))
            .map(|item| self.builder.build(item, collected_at))
            .collect();
        let next_page = self.adapter.next_page_ref(&document, &page_url);

        PageOutcome {
            records,
            next_page,
            stats,
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().map(|stop| *stop.borrow()).unwrap_or(false)
    }

    /// Sleep for the pacer's delay. Returns `true` when a stop arrived meanwhile.
    async fn pause(&self) -> bool {
        let delay = self.pacer.next_delay();
        if delay.is_zero() {
            return self.stop_requested();
        }
        debug!("Pausing {:.2}s before the next page", delay.as_secs_f64());

        let Some(stop) = &self.stop else {
            tokio::time::sleep(delay).await;
            return false;
        };
        let mut stop = stop.clone();
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = wait_for_stop(&mut stop) => true,
        }
    }

    fn log_termination(&self, termination: &Termination, session: &CrawlSession) {
        let pages = session.page_count;
        let records = session.collected.len();
        match termination {
            Termination::NoNextPage => info!("🏁 No next page after {} pages; {} records", pages, records),
            Termination::EmptyPage => info!("🏁 Empty page reached after {} pages; {} records", pages, records),
            Termination::PageCapReached => {
                info!("🏁 Page cap of {} reached; {} records", session.max_pages, records)
            }
            Termination::Stopped => warn!("🛑 Stopped by operator after {} pages; {} records kept", pages, records),
            Termination::FetchFailed(reason) => {
                warn!("❌ Fetch failed after {} pages ({}); {} records kept", pages, reason, records)
            }
        }
        let stats = &session.stats;
        if stats.items_skipped > 0 || stats.unparseable_prices > 0 {
            info!(
                "Extraction losses: {} items skipped, {} missing links, {} missing initial prices, {} missing promo prices, {} unparseable prices",
                stats.items_skipped,
                stats.missing_link,
                stats.missing_price_initial,
                stats.missing_price_promo,
                stats.unparseable_prices
            );
        }
    }
}

async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    loop {
        let stopped = *stop.borrow();
        if stopped {
            return;
        }
        if stop.changed().await.is_err() {
            // Sender gone: a stop can no longer arrive.
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JumiaAdapter;
    use crate::app::ports::PageFetcher;
    use crate::types::{FetchedPage, Marketplace};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            Ok(match self.0.get(url) {
                Some(markup) => FetchedPage {
                    status: 200,
                    markup: markup.clone(),
                },
                None => FetchedPage {
                    status: 404,
                    markup: String::new(),
                },
            })
        }
    }

    fn page(names: &[&str], next: Option<&str>) -> String {
        let mut html = String::from("<html><body>");
        for name in names {
            html.push_str(&format!(
                r#"<a href="/p/{name}"><div class="info"><h3 class="name">{name}</h3><div class="prc">100.00 Dhs</div></div></a>"#
            ));
        }
        if let Some(next) = next {
            html.push_str(&format!(r#"<a href="{next}" aria-label="Page suivante">&gt;</a>"#));
        }
        html.push_str("</body></html>");
        html
    }

    fn controller(pages: &[(&str, String)]) -> CrawlController {
        let fetcher = MapFetcher(pages.iter().map(|(u, m)| (u.to_string(), m.clone())).collect());
        CrawlController::new(
            Box::new(JumiaAdapter::new().unwrap()),
            Box::new(fetcher),
            RecordBuilder::new(Marketplace::Jumia, "Réfrigérateurs"),
        )
    }

    #[test]
    fn test_process_page_stamps_one_collection_time() {
        let controller = controller(&[]);
        let at = chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let outcome = controller.process_page(&page(&["a", "b", "c"], Some("/x?page=2")), "https://www.jumia.ma/x", at);

        assert_eq!(outcome.records.len(), 3);
        assert!(outcome.records.iter().all(|r| r.collection_time == at));
        assert_eq!(outcome.next_page.as_deref(), Some("https://www.jumia.ma/x?page=2"));
        assert_eq!(outcome.stats.items_seen, 3);
    }

    #[tokio::test]
    async fn test_follows_next_page_until_exhausted() {
        let controller = controller(&[
            ("https://www.jumia.ma/l", page(&["a", "b"], Some("/l?page=2"))),
            ("https://www.jumia.ma/l?page=2", page(&["c"], None)),
        ]);

        let report = controller.run("https://www.jumia.ma/l", 10).await.unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.termination, Termination::NoNextPage);
    }

    #[test]
    fn test_relative_references_resolve_against_the_page() {
        let controller = controller(&[]);
        let at = chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let markup = r#"<a href="item-1.html"><div class="info"><h3 class="name">a</h3><div class="prc">100.00 Dhs</div></div></a>
<a href="?page=3" aria-label="Page suivante">&gt;</a>"#;

        let outcome = controller.process_page(markup, "https://www.jumia.ma/pc-portables/?page=2", at);
        assert_eq!(outcome.records[0].link.as_deref(), Some("https://www.jumia.ma/pc-portables/item-1.html"));
        assert_eq!(outcome.next_page.as_deref(), Some("https://www.jumia.ma/pc-portables/?page=3"));
    }

    #[tokio::test]
    async fn test_query_only_next_page_is_followed_on_the_same_path() {
        let controller = controller(&[
            ("https://www.jumia.ma/pc-portables/", page(&["a"], Some("?page=2"))),
            ("https://www.jumia.ma/pc-portables/?page=2", page(&["b"], None)),
        ]);

        let report = controller.run("https://www.jumia.ma/pc-portables/", 10).await.unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.termination, Termination::NoNextPage);
    }

    #[tokio::test]
    async fn test_http_error_keeps_collected_records() {
        let controller = controller(&[("https://www.jumia.ma/l", page(&["a"], Some("/missing")))]);

        let report = controller.run("https://www.jumia.ma/l", 10).await.unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.termination, Termination::FetchFailed("HTTP status 404".to_string()));
    }

    #[tokio::test]
    async fn test_zero_cap_fetches_nothing() {
        let controller = controller(&[("https://www.jumia.ma/l", page(&["a"], None))]);
        let report = controller.run("https://www.jumia.ma/l", 0).await.unwrap();
        assert_eq!(report.pages, 0);
        assert_eq!(report.termination, Termination::PageCapReached);
    }

    #[tokio::test]
    async fn test_stop_before_first_fetch() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let controller = controller(&[("https://www.jumia.ma/l", page(&["a"], None))]).with_stop_signal(rx);

        let report = controller.run("https://www.jumia.ma/l", 10).await.unwrap();
        assert_eq!(report.termination, Termination::Stopped);
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn test_stop_interrupts_pacing() {
        let (tx, rx) = watch::channel(false);
        let controller = controller(&[
            ("https://www.jumia.ma/l", page(&["a"], Some("/l?page=2"))),
            ("https://www.jumia.ma/l?page=2", page(&["b"], None)),
        ])
        .with_pacer(crate::pipeline::pacing::JitteredPacer::from_secs_f64(30.0, 30.0))
        .with_stop_signal(rx);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            tx.send(true).unwrap();
            tx
        });

        let started = std::time::Instant::now();
        let report = controller.run("https://www.jumia.ma/l", 10).await.unwrap();
        let _tx = stopper.await.unwrap();

        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert_eq!(report.termination, Termination::Stopped);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.pages, 1);
    }
}
