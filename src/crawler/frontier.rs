//! Crawl frontier: pending work plus the visited set
//!
//! The pending queue and the visited set are separate mutex-guarded
//! collections. The scheduler drains the whole queue at the start of a round,
//! so newly pushed items are never mixed into a round that is being dispatched.

use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// A result page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    keyword: String,
    page: u32,
    url: String,
}

impl WorkItem {
    /// Creates a work item; the stored URL is the normalized form of `url`
    pub fn new(keyword: &str, page: u32, url: &Url) -> Self {
        let url = normalize_url(url.as_str())
            .map(String::from)
            .unwrap_or_else(|_| url.to_string());

        Self {
            keyword: keyword.to_string(),
            page,
            url,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// The normalized URL, which is also the item's identity
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether this is the keyword's first result page
    pub fn is_first_page(&self) -> bool {
        self.page <= 1
    }
}

/// Pending work items and the set of URLs already dispatched
#[derive(Debug, Default)]
pub struct Frontier {
    pending: Mutex<VecDeque<WorkItem>>,
    visited: Mutex<HashSet<String>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item to the back of the queue
    pub fn push(&self, item: WorkItem) {
        self.lock_pending().push_back(item);
    }

    /// Adds items to the back of the queue, keeping their order
    pub fn extend(&self, items: impl IntoIterator<Item = WorkItem>) {
        self.lock_pending().extend(items);
    }

    /// Removes and returns everything currently pending
    pub fn take_round(&self) -> Vec<WorkItem> {
        self.lock_pending().drain(..).collect()
    }

    /// Records the item's URL as visited
    ///
    /// Returns `false` if the URL had already been visited, in which case the
    /// item must not be fetched again.
    pub fn mark_visited(&self, item: &WorkItem) -> bool {
        self.lock_visited().insert(item.url.clone())
    }

    pub fn visited_count(&self) -> usize {
        self.lock_visited().len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_pending().is_empty()
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<WorkItem>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_visited(&self) -> MutexGuard<'_, HashSet<String>> {
        self.visited.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
