//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the crawl together:
//! - Seeding the frontier with the first result page of every keyword
//! - Running the scheduler with a worker that fetches, extracts and stores
//! - Feeding first pages to pagination discovery
//! - Closing the storage pipeline and collecting run statistics

use crate::config::Config;
use crate::crawler::extract::{Extractor, NextDataExtractor};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::{Frontier, WorkItem};
use crate::crawler::pagination::PaginationDiscoverer;
use crate::crawler::scheduler::Scheduler;
use crate::output::{CrawlStatistics, CrawlStats};
use crate::record::Record;
use crate::storage::{CsvSink, RecordSink, StoragePipeline};
use crate::url::SearchTemplate;
use crate::TrawlError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Main crawler coordinator structure
///
/// A coordinator owns one storage pipeline, so records are deduplicated
/// across every run it performs.
pub struct Coordinator<E: Extractor> {
    config: Arc<Config>,
    fetcher: Arc<Fetcher>,
    extractor: Arc<E>,
    pipeline: Arc<StoragePipeline<E::Record>>,
    template: SearchTemplate,
}

impl Coordinator<NextDataExtractor> {
    /// Creates a coordinator that extracts `__NEXT_DATA__` search results and
    /// appends them to the configured CSV file
    pub fn from_config(config: Config) -> Result<Self, TrawlError> {
        let sink = CsvSink::new(&config.output.csv_path);
        Self::new(config, NextDataExtractor::new()?, sink)
    }
}

impl<E: Extractor> Coordinator<E> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `extractor` - Turns fetched pages into records
    /// * `sink` - Where flushed batches are written
    pub fn new(
        config: Config,
        extractor: E,
        sink: impl RecordSink<E::Record> + 'static,
    ) -> Result<Self, TrawlError> {
        let fetcher = Fetcher::from_config(&config)?;
        let template = SearchTemplate::from_config(&config.target)?;
        let pipeline = StoragePipeline::new(sink, config.output.flush_threshold);

        Ok(Self {
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
            pipeline: Arc::new(pipeline),
            template,
        })
    }

    pub fn pipeline(&self) -> &StoragePipeline<E::Record> {
        &self.pipeline
    }

    /// The first-page work item for `keyword`
    pub fn seed(&self, keyword: &str) -> WorkItem {
        WorkItem::new(keyword, 1, &self.template.page_url(keyword, 1))
    }

    /// Crawls every keyword until no work is left, `cancel` fires, or a
    /// batch cannot be stored
    ///
    /// The storage pipeline is closed before returning in every case, so
    /// buffered records reach the sink even when the run is cut short.
    pub async fn run(
        &self,
        keywords: &[String],
        cancel: CancellationToken,
    ) -> Result<CrawlStatistics, TrawlError> {
        if keywords.is_empty() {
            return Err(TrawlError::NoKeywords);
        }

        let started_at = Utc::now();
        tracing::info!("Starting crawl of {} keywords", keywords.len());

        let discoverer = PaginationDiscoverer::new(
            self.template.clone(),
            &self.config.target.last_page_selector,
            self.config.crawler.max_page_depth,
        )?;
        let frontier = Arc::new(Frontier::new());
        for keyword in keywords {
            discoverer.register(keyword);
            frontier.push(self.seed(keyword));
        }

        let stats = Arc::new(CrawlStats::new());
        let page_worker = Arc::new(PageWorker {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            pipeline: Arc::clone(&self.pipeline),
            discoverer,
            stats: Arc::clone(&stats),
            retries: self.config.crawler.retries,
        });

        let scheduler = Scheduler::new(
            frontier,
            self.config.crawler.pool_size as usize,
            Duration::from_millis(self.config.crawler.politeness_interval),
        );

        let outcome = scheduler
            .run(
                move |item| {
                    let page_worker = Arc::clone(&page_worker);
                    async move { page_worker.process(item).await }
                },
                &cancel,
            )
            .await;

        let closed = self.pipeline.close();
        let report = outcome?;
        closed?;

        let mut statistics = CrawlStatistics::from_counters(keywords.len(), &stats, started_at);
        statistics.rounds = report.rounds;
        statistics.pages_dispatched = report.dispatched;
        statistics.pages_skipped = report.skipped;
        statistics.records_stored = self.pipeline.stored_count();
        statistics.duplicates = self.pipeline.duplicate_count();
        statistics.flushes = self.pipeline.flush_count();
        statistics.cancelled = report.cancelled;

        tracing::info!(
            "Crawl completed: {} pages fetched, {} records stored in {}s",
            statistics.pages_fetched,
            statistics.records_stored,
            statistics.duration_seconds()
        );

        Ok(statistics)
    }
}

/// Everything one worker needs to process a page
struct PageWorker<E: Extractor> {
    fetcher: Arc<Fetcher>,
    extractor: Arc<E>,
    pipeline: Arc<StoragePipeline<E::Record>>,
    discoverer: PaginationDiscoverer,
    stats: Arc<CrawlStats>,
    retries: u32,
}

impl<E: Extractor> PageWorker<E> {
    /// Processes a single page
    ///
    /// This method:
    /// 1. Fetches the page with retries
    /// 2. Extracts records and hands them to the pipeline in document order
    /// 3. Runs pagination discovery on a keyword's first page
    ///
    /// A failed fetch abandons the item. Only storage failures are returned.
    async fn process(&self, item: WorkItem) -> Result<Vec<WorkItem>, TrawlError> {
        let response = match self.fetcher.fetch(item.url(), self.retries).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{}", e);
                CrawlStats::bump(&self.stats.fetch_failures, 1);
                return Ok(Vec::new());
            }
        };
        CrawlStats::bump(&self.stats.pages_fetched, 1);
        CrawlStats::bump(&self.stats.retries_used, u64::from(response.retries_used));

        self.store_records(&item, &response.body)?;

        if item.is_first_page() {
            return Ok(self.discoverer.discover(item.keyword(), &response.body));
        }
        Ok(Vec::new())
    }

    fn store_records(&self, item: &WorkItem, body: &str) -> Result<(), TrawlError> {
        let results = match self.extractor.extract(body) {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("No records on {}: {}", item.url(), e);
                CrawlStats::bump(&self.stats.malformed_pages, 1);
                return Ok(());
            }
        };

        for result in results {
            match result {
                Ok(record) => {
                    CrawlStats::bump(&self.stats.records_extracted, 1);
                    tracing::debug!("Extracted {} from {}", record.natural_key(), item.url());
                    self.pipeline.add(record)?;
                }
                Err(e) => {
                    tracing::error!("Skipping result on {}: {}", item.url(), e);
                    CrawlStats::bump(&self.stats.record_errors, 1);
                }
            }
        }
        Ok(())
    }
}

/// Runs the main crawl operation
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `keywords` - Keywords to crawl, in seed order
/// * `cancel` - Fires to stop the crawl early
///
/// # Example
///
/// ```no_run
/// use search_trawler::config::load_config;
/// use search_trawler::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("trawler.toml"))?;
/// let keywords = config.keywords.clone();
/// let stats = run_crawl(config, &keywords, CancellationToken::new()).await?;
/// println!("{} records stored", stats.records_stored);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    keywords: &[String],
    cancel: CancellationToken,
) -> Result<CrawlStatistics, TrawlError> {
    let coordinator = Coordinator::from_config(config)?;
    coordinator.run(keywords, cancel).await
}
