//! URL handling module for Search-Trawler
//!
//! This module provides URL normalization for the visited set, the search
//! results URL template, and forwarding-proxy rewriting.

mod normalize;
mod proxy;
mod search;

pub use normalize::normalize_url;
pub use proxy::ProxyEndpoint;
pub use search::SearchTemplate;
