//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a mock search site and run the full
//! crawl cycle end-to-end, from seeding keywords to the CSV on disk.

use search_trawler::config::{
    Config, CrawlerConfig, HttpConfig, OutputConfig, ProxyConfig, TargetConfig,
};
use search_trawler::crawler::{run_crawl, Coordinator};
use search_trawler::storage::StorageError;
use search_trawler::TrawlError;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const HEADER: &str = "name,stars,rating,num_reviews";

/// Matches requests that do not carry the given query parameter
struct WithoutQueryParam(&'static str);

impl Match for WithoutQueryParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

/// Creates a test configuration pointing at `base_url` and writing to `csv_path`
fn create_test_config(base_url: &str, csv_path: &Path, max_page_depth: u32) -> Config {
    Config {
        keywords: vec![],
        crawler: CrawlerConfig {
            pool_size: 2,
            retries: 1,
            max_page_depth,
            politeness_interval: 10, // Very short for testing
        },
        target: TargetConfig {
            base_url: base_url.to_string(),
            search_path: "/search".to_string(),
            last_page_selector: "a[data-pagination-button-last-link='true']".to_string(),
            accepted_statuses: vec![200, 404],
        },
        http: HttpConfig::default(),
        proxy: None,
        output: OutputConfig {
            csv_path: csv_path.display().to_string(),
            flush_threshold: 2,
        },
    }
}

/// Renders a result page with the given entries and optional last page link
fn results_page(keyword: &str, entries: &[(&str, f64, f64, u64)], last_page: Option<u32>) -> String {
    let units: Vec<String> = entries
        .iter()
        .map(|(name, stars, score, reviews)| {
            format!(
                r#"{{"displayName":"{}","stars":{},"trustScore":{},"numberOfReviews":{}}}"#,
                name, stars, score, reviews
            )
        })
        .collect();

    let pagination = last_page
        .map(|last| {
            format!(
                r#"<nav>
                <a href="/search?query={kw}&page=2">2</a>
                <a data-pagination-button-last-link="true" href="/search?query={kw}&page={last}">Last</a>
                </nav>"#,
                kw = keyword,
                last = last
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html><head><title>Search</title></head><body>
        <div id="__next">{}</div>
        <script id="__NEXT_DATA__" type="application/json">{{"props":{{"pageProps":{{"businessUnits":[{}]}}}}}}</script>
        </body></html>"#,
        pagination,
        units.join(",")
    )
}

/// Header line plus data rows sorted, since rows from one round land in any order
fn read_csv(path: &Path) -> (String, Vec<String>) {
    let content = std::fs::read_to_string(path).expect("Failed to read CSV output");
    let mut lines = content.lines().map(str::to_string);
    let header = lines.next().unwrap_or_default();
    let mut rows: Vec<String> = lines.collect();
    rows.sort();
    (header, rows)
}

#[tokio::test]
async fn test_full_crawl_with_pagination_and_duplicates() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("results.csv");

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "vpn"))
        .and(WithoutQueryParam("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(
            "vpn",
            &[
                ("Alpha", 4.5, 4.2, 100),
                ("Beta", 3.0, 2.9, 12),
                ("Gamma", 5.0, 4.9, 3000),
            ],
            Some(5),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(
            "vpn",
            &[("Delta", 4.0, 3.8, 7), ("Alpha", 1.0, 1.0, 1)],
            Some(5),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(
            "vpn",
            &[("Epsilon", 2.5, 2.1, 1)],
            Some(5),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Depth 3 caps the crawl before pages 4 and 5
    Mock::given(method("GET"))
        .and(query_param("page", "4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, 3);
    let stats = run_crawl(config, &["vpn".to_string()], CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(stats.rounds, 2);
    assert_eq!(stats.pages_dispatched, 3);
    assert_eq!(stats.pages_fetched, 3);
    assert_eq!(stats.records_extracted, 6);
    assert_eq!(stats.records_stored, 5);
    assert_eq!(stats.duplicates, 1);
    assert!(!stats.cancelled);

    let (header, rows) = read_csv(&csv_path);
    assert_eq!(header, HEADER);
    assert_eq!(
        rows,
        vec![
            "Alpha,4.5,4.2,100",
            "Beta,3.0,2.9,12",
            "Delta,4.0,3.8,7",
            "Epsilon,2.5,2.1,1",
            "Gamma,5.0,4.9,3000",
        ]
    );
}

#[tokio::test]
async fn test_multiple_keywords_share_one_output() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("results.csv");

    for (keyword, name) in [("vpn", "Alpha"), ("hosting", "Beta")] {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", keyword))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(
                keyword,
                &[(name, 4.0, 4.0, 10), ("Shared", 3.0, 3.0, 5)],
                None,
            )))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri(), &csv_path, 0);
    let keywords = vec!["vpn".to_string(), "hosting".to_string()];
    let stats = run_crawl(config, &keywords, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(stats.keywords, 2);
    assert_eq!(stats.rounds, 1);
    assert_eq!(stats.records_stored, 3);
    assert_eq!(stats.duplicates, 1);

    let (header, rows) = read_csv(&csv_path);
    assert_eq!(header, HEADER);
    assert_eq!(
        rows,
        vec!["Alpha,4.0,4.0,10", "Beta,4.0,4.0,10", "Shared,3.0,3.0,5"]
    );
}

#[tokio::test]
async fn test_zero_result_keyword_completes() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("results.csv");

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(404).set_body_string(results_page("zzzz", &[], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, 3);
    let stats = run_crawl(config, &["zzzz".to_string()], CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.records_stored, 0);
    assert_eq!(stats.fetch_failures, 0);
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_existing_csv_gets_no_second_header() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("results.csv");
    std::fs::write(&csv_path, format!("{}\nOld,1.0,1.0,1\n", HEADER)).unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(
            "vpn",
            &[("New", 2.0, 2.0, 2)],
            None,
        )))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, 0);
    run_crawl(config, &["vpn".to_string()], CancellationToken::new())
        .await
        .expect("Crawl failed");

    let (header, rows) = read_csv(&csv_path);
    assert_eq!(header, HEADER);
    assert_eq!(rows, vec!["New,2.0,2.0,2", "Old,1.0,1.0,1"]);
}

#[tokio::test]
async fn test_crawl_through_proxy() {
    let proxy_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("results.csv");

    Mock::given(method("GET"))
        .and(path("/v1/"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("url", "https://www.trustpilot.com/search?query=vpn"))
        .and(query_param("country", "de"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(
            "vpn",
            &[("Proxied", 4.0, 4.0, 40)],
            None,
        )))
        .expect(1)
        .mount(&proxy_server)
        .await;

    let mut config = create_test_config("https://www.trustpilot.com", &csv_path, 2);
    config.proxy = Some(ProxyConfig {
        endpoint: format!("{}/v1/", proxy_server.uri()),
        api_key: "test-key".to_string(),
        country: "de".to_string(),
    });

    let stats = run_crawl(config, &["vpn".to_string()], CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(stats.records_stored, 1);
    let (_, rows) = read_csv(&csv_path);
    assert_eq!(rows, vec!["Proxied,4.0,4.0,40"]);
}

#[tokio::test]
async fn test_unwritable_output_fails_the_run() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("missing-dir").join("results.csv");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(
            "vpn",
            &[("Alpha", 4.0, 4.0, 1), ("Beta", 4.0, 4.0, 1)],
            None,
        )))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, 0);
    let result = run_crawl(config, &["vpn".to_string()], CancellationToken::new()).await;

    match result {
        Err(TrawlError::Storage(StorageError::BatchLost { keys, .. })) => {
            assert_eq!(keys, vec!["Alpha".to_string(), "Beta".to_string()]);
        }
        other => panic!("Expected a lost batch, got {:?}", other.map(|s| s.records_stored)),
    }
}

#[tokio::test]
async fn test_cancelled_run_fetches_nothing() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("results.csv");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &csv_path, 0);
    let coordinator = Coordinator::from_config(config).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let stats = coordinator
        .run(&["vpn".to_string()], cancel)
        .await
        .expect("Cancelled crawl should still succeed");

    assert!(stats.cancelled);
    assert_eq!(stats.pages_dispatched, 0);
    assert_eq!(coordinator.pipeline().pending(), 0);
}
