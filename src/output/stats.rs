//! Run statistics
//!
//! Workers bump the counters in [`CrawlStats`] while the crawl runs; the
//! coordinator turns them into a [`CrawlStatistics`] summary at the end.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by all workers of one run
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub pages_fetched: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub retries_used: AtomicU64,
    pub records_extracted: AtomicU64,
    pub record_errors: AtomicU64,
    pub malformed_pages: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` to a counter
    pub fn bump(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// Crawl statistics summary
#[derive(Debug, Clone, Serialize)]
pub struct CrawlStatistics {
    /// Keywords the run was seeded with
    pub keywords: usize,

    /// Scheduler rounds that dispatched work
    pub rounds: u64,

    /// Work items handed to workers
    pub pages_dispatched: u64,

    /// Work items dropped because their URL was already visited
    pub pages_skipped: u64,

    /// Pages fetched with an accepted status
    pub pages_fetched: u64,

    /// Pages abandoned after exhausting retries
    pub fetch_failures: u64,

    /// Retries spent across all fetches
    pub retries_used: u64,

    /// Records extracted before deduplication
    pub records_extracted: u64,

    /// Records written to the output
    pub records_stored: u64,

    /// Records dropped as duplicates
    pub duplicates: u64,

    /// Result entries that could not be turned into records
    pub record_errors: u64,

    /// Fetched pages without a readable payload
    pub malformed_pages: u64,

    /// Batches written to the output
    pub flushes: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Whether the run was interrupted
    pub cancelled: bool,
}

impl CrawlStatistics {
    /// Starts a summary from the live counters; scheduler and pipeline
    /// figures are filled in by the caller
    pub fn from_counters(keywords: usize, stats: &CrawlStats, started_at: DateTime<Utc>) -> Self {
        Self {
            keywords,
            rounds: 0,
            pages_dispatched: 0,
            pages_skipped: 0,
            pages_fetched: CrawlStats::get(&stats.pages_fetched),
            fetch_failures: CrawlStats::get(&stats.fetch_failures),
            retries_used: CrawlStats::get(&stats.retries_used),
            records_extracted: CrawlStats::get(&stats.records_extracted),
            records_stored: 0,
            duplicates: 0,
            record_errors: CrawlStats::get(&stats.record_errors),
            malformed_pages: CrawlStats::get(&stats.malformed_pages),
            flushes: 0,
            started_at,
            finished_at: Utc::now(),
            cancelled: false,
        }
    }

    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Keywords: {}", stats.keywords);
    println!("  Rounds: {}", stats.rounds);
    println!(
        "  Started: {}",
        stats.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Duration: {}s", stats.duration_seconds());
    if stats.cancelled {
        println!("  Status: cancelled");
    }
    println!();

    println!("Pages:");
    println!("  Dispatched: {}", stats.pages_dispatched);
    println!("  Skipped (already visited): {}", stats.pages_skipped);
    println!("  Fetched: {}", stats.pages_fetched);
    println!("  Failed: {}", stats.fetch_failures);
    println!("  Retries used: {}", stats.retries_used);
    println!("  Without payload: {}", stats.malformed_pages);
    println!();

    println!("Records:");
    println!("  Extracted: {}", stats.records_extracted);
    println!("  Stored: {}", stats.records_stored);
    println!("  Duplicates dropped: {}", stats.duplicates);
    println!("  Invalid entries: {}", stats.record_errors);
    println!("  Batches written: {}", stats.flushes);
    println!();

    let success_rate = if stats.pages_dispatched > 0 {
        (stats.pages_fetched as f64 / stats.pages_dispatched as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched)",
        success_rate, stats.pages_fetched, stats.pages_dispatched
    );
}
