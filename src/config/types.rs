use serde::Deserialize;

/// Main configuration structure for Search-Trawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seed keywords, used when none are given on the command line
    #[serde(default)]
    pub keywords: Vec<String>,
    pub crawler: CrawlerConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers per round
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: u32,

    /// Retries after the first failed attempt of a fetch
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Deepest result page fetched per keyword (0 means no cap)
    #[serde(rename = "max-page-depth", default = "default_max_page_depth")]
    pub max_page_depth: u32,

    /// Pause between dispatch rounds (milliseconds)
    #[serde(rename = "politeness-interval", default = "default_politeness_interval")]
    pub politeness_interval: u64,
}

/// The search site being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Scheme and host of the search site, e.g. `https://www.trustpilot.com`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the search endpoint
    #[serde(rename = "search-path", default = "default_search_path")]
    pub search_path: String,

    /// CSS selector of the "last page" pagination link
    #[serde(rename = "last-page-selector", default = "default_last_page_selector")]
    pub last_page_selector: String,

    /// Status codes treated as a successful fetch
    #[serde(rename = "accepted-statuses", default = "default_accepted_statuses")]
    pub accepted_statuses: Vec<u16>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

/// Forwarding proxy that fetches the target URL on our behalf
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Proxy endpoint, e.g. `https://proxy.scrapeops.io/v1/`
    pub endpoint: String,

    /// API key passed as the `api_key` parameter
    #[serde(rename = "api-key")]
    pub api_key: String,

    /// Geography hint passed as the `country` parameter
    #[serde(default = "default_country")]
    pub country: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV file records are appended to
    #[serde(rename = "csv-path")]
    pub csv_path: String,

    /// Buffered record count that triggers a write
    #[serde(rename = "flush-threshold", default = "default_flush_threshold")]
    pub flush_threshold: usize,
}

fn default_pool_size() -> u32 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_max_page_depth() -> u32 {
    2
}

fn default_politeness_interval() -> u64 {
    3000
}

fn default_search_path() -> String {
    "/search".to_string()
}

fn default_last_page_selector() -> String {
    "a[data-pagination-button-last-link='true']".to_string()
}

fn default_accepted_statuses() -> Vec<u16> {
    vec![200, 404]
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/123.0.0.0 Safari/537.3"
        .to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_country() -> String {
    "us".to_string()
}

fn default_flush_threshold() -> usize {
    50
}
