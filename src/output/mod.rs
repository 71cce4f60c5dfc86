//! Output module for crawl summaries
//!
//! This module handles:
//! - Counting what a run fetched, extracted and stored
//! - Printing the end-of-run summary

pub mod stats;

pub use stats::{print_statistics, CrawlStatistics, CrawlStats};
