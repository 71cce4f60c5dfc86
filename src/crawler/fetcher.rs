//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Optional rewriting of every request through a forwarding proxy
//! - Retry logic for unexpected status codes and transport failures

use crate::config::{Config, HttpConfig};
use crate::url::ProxyEndpoint;
use crate::TrawlError;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A response with an accepted status code
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The target URL (not the proxy URL)
    pub url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Response body
    pub body: String,
    /// Retries needed before this response arrived
    pub retries_used: u32,
}

/// Why one attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The server answered with a status outside the accepted set
    Status(u16),
    /// The request never produced a usable response
    Transport(String),
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Transport(error) => write!(f, "{}", error),
        }
    }
}

/// Fetch failures reported to the caller
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Giving up on {url} after {attempts} attempts, last failure: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: AttemptFailure,
    },
}

/// Builds an HTTP client with the configured user agent and timeout
///
/// # Example
///
/// ```no_run
/// use search_trawler::config::HttpConfig;
/// use search_trawler::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout))
        .connect_timeout(Duration::from_secs(config.timeout.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs GET requests with bounded retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Accepted status (default 200, 404) | Return the response |
/// | Any other status | Retry immediately |
/// | Timeout, connection or body error | Retry immediately |
/// | `retries` retries used up | Return `FetchError::Exhausted` |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    proxy: Option<ProxyEndpoint>,
    accepted_statuses: Vec<u16>,
}

impl Fetcher {
    pub fn new(client: Client, proxy: Option<ProxyEndpoint>, accepted_statuses: Vec<u16>) -> Self {
        Self {
            client,
            proxy,
            accepted_statuses,
        }
    }

    /// Builds a fetcher from the `[http]`, `[proxy]` and `[target]` sections
    pub fn from_config(config: &Config) -> Result<Self, TrawlError> {
        let client = build_http_client(&config.http)?;
        let proxy = config
            .proxy
            .as_ref()
            .map(ProxyEndpoint::from_config)
            .transpose()?;
        Ok(Self::new(
            client,
            proxy,
            config.target.accepted_statuses.clone(),
        ))
    }

    /// Whether `status` counts as a successful fetch
    pub fn accepts(&self, status: u16) -> bool {
        self.accepted_statuses.contains(&status)
    }

    /// Fetches `url`, retrying up to `retries` times after the first attempt
    pub async fn fetch(&self, url: &str, retries: u32) -> Result<FetchResponse, FetchError> {
        let request_url = match &self.proxy {
            Some(proxy) => proxy.wrap(url).to_string(),
            None => url.to_string(),
        };

        let mut attempt = 0;
        loop {
            let failure = match self.attempt(&request_url, url).await {
                Ok((status_code, body)) => {
                    return Ok(FetchResponse {
                        url: url.to_string(),
                        status_code,
                        body,
                        retries_used: attempt,
                    });
                }
                Err(failure) => failure,
            };

            if attempt >= retries {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt + 1,
                    last_error: failure,
                });
            }

            attempt += 1;
            tracing::info!(
                "Retrying request for page: {} ({}, retry {}/{})",
                url,
                failure,
                attempt,
                retries
            );
        }
    }

    async fn attempt(&self, request_url: &str, url: &str) -> Result<(u16, String), AttemptFailure> {
        let response = self
            .client
            .get(request_url)
            .send()
            .await
            .map_err(|e| AttemptFailure::Transport(classify(&e)))?;

        let status = response.status().as_u16();
        tracing::info!("Received [{}] from: {}", status, url);

        if !self.accepts(status) {
            return Err(AttemptFailure::Status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AttemptFailure::Transport(classify(&e)))?;
        Ok((status, body))
    }
}

fn classify(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    }
}
