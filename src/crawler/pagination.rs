//! Per-keyword pagination discovery
//!
//! The first result page of a keyword carries a "last page" link. The
//! discoverer reads the page number from it once per keyword and emits the
//! remaining pages, capped at the configured depth.

use crate::crawler::frontier::WorkItem;
use crate::url::SearchTemplate;
use crate::TrawlError;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Discovery progress for one keyword
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationState {
    pub discovered: bool,
    pub last_page: u32,
}

/// Turns first-page responses into follow-up work items
#[derive(Debug)]
pub struct PaginationDiscoverer {
    template: SearchTemplate,
    last_page_link: Selector,
    max_depth: u32,
    states: Mutex<HashMap<String, PaginationState>>,
}

impl PaginationDiscoverer {
    /// Creates a discoverer
    ///
    /// # Arguments
    ///
    /// * `template` - Builds the URLs of the emitted pages
    /// * `last_page_selector` - CSS selector of the "last page" link
    /// * `max_depth` - Deepest page emitted; 0 disables the cap
    pub fn new(
        template: SearchTemplate,
        last_page_selector: &str,
        max_depth: u32,
    ) -> Result<Self, TrawlError> {
        let last_page_link =
            Selector::parse(last_page_selector).map_err(|e| TrawlError::Selector {
                selector: last_page_selector.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            template,
            last_page_link,
            max_depth,
            states: Mutex::new(HashMap::new()),
        })
    }

    /// Starts tracking a keyword as undiscovered; existing state is kept
    pub fn register(&self, keyword: &str) {
        self.lock_states()
            .entry(keyword.to_string())
            .or_default();
    }

    /// Current state of a keyword, if it was registered
    pub fn state(&self, keyword: &str) -> Option<PaginationState> {
        self.lock_states().get(keyword).copied()
    }

    /// Whether the keyword still needs discovery
    pub fn is_pending(&self, keyword: &str) -> bool {
        self.state(keyword)
            .map(|state| !state.discovered)
            .unwrap_or(false)
    }

    /// Emits the pages after the first for `keyword`
    ///
    /// Returns an empty list when the keyword is unknown or already
    /// discovered, or when `first_page` has no usable last-page link. When
    /// several callers race on the same keyword only one gets the pages.
    pub fn discover(&self, keyword: &str, first_page: &str) -> Vec<WorkItem> {
        if !self.is_pending(keyword) {
            return Vec::new();
        }

        let Some(last_page) = self.parse_last_page(first_page) else {
            tracing::debug!("No last page link for '{}', treating as one page", keyword);
            return Vec::new();
        };

        let capped = if self.max_depth > 0 {
            last_page.min(self.max_depth)
        } else {
            last_page
        };

        {
            let mut states = self.lock_states();
            let Some(state) = states.get_mut(keyword) else {
                return Vec::new();
            };
            if state.discovered {
                return Vec::new();
            }
            state.discovered = true;
            state.last_page = last_page;
        }

        tracing::info!(
            "Keyword '{}' has {} result pages, queueing pages 2..={}",
            keyword,
            last_page,
            capped
        );

        (2..=capped)
            .map(|page| WorkItem::new(keyword, page, &self.template.page_url(keyword, page)))
            .collect()
    }

    fn parse_last_page(&self, body: &str) -> Option<u32> {
        let document = Html::parse_document(body);
        let href = document
            .select(&self.last_page_link)
            .next()?
            .value()
            .attr("href")?;
        self.template.page_number(href)
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<String, PaginationState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
