//! Crawler module for search result harvesting
//!
//! This module contains the core crawling logic, including:
//! - The frontier of pending result pages and the visited set
//! - HTTP fetching with retry logic and optional proxy routing
//! - Record extraction and pagination discovery
//! - Round-based scheduling on a bounded worker pool
//! - Overall crawl coordination

mod coordinator;
mod extract;
mod fetcher;
mod frontier;
mod pagination;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use extract::{ExtractError, Extractor, NextDataExtractor, RecordResult};
pub use fetcher::{build_http_client, AttemptFailure, FetchError, FetchResponse, Fetcher};
pub use frontier::{Frontier, WorkItem};
pub use pagination::{PaginationDiscoverer, PaginationState};
pub use scheduler::{Scheduler, SchedulerReport};
