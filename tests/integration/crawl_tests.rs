//! Integration tests for the scanner
//!
//! These tests use wiremock to create mock HTTP servers and test
//! fetching, retrying and the full scan cycle end-to-end.

use paper_sieve::config::{Config, CrawlerConfig, OutputConfig, SearchConfig, SiteConfig};
use paper_sieve::crawler::{
    build_http_client, crawl, crawl_and_report, Coordinator, FetchOutcome, PageFetcher,
    PaperMatch, RetryPolicy, TransportError,
};
use paper_sieve::extract::{AbstractExtractor, BibtexExtractor};
use paper_sieve::{ExtractionError, SieveError};
use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, keywords: &[&str], output_dir: &str) -> Config {
    Config {
        site: SiteConfig {
            archive_url: format!("{}/archives/", base_url),
            origin: base_url.to_string(),
            doi_prefix: "https://doi.org".to_string(),
        },
        search: SearchConfig {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        },
        crawler: CrawlerConfig {
            workers: 10,
            request_timeout: 5,
            max_attempts: 3,
            backoff_base: 10, // Very short for testing
            backoff_multiplier: 2,
            user_agent: "TestSieve/1.0".to_string(),
        },
        output: OutputConfig {
            directory: output_dir.to_string(),
            extension: "csv".to_string(),
        },
    }
}

fn fast_fetcher(max_attempts: u32, timeout: Duration) -> PageFetcher {
    let client = build_http_client("TestSieve/1.0", timeout).expect("Failed to build client");
    PageFetcher::new(
        client,
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            multiplier: 2,
        },
    )
}

fn archive_page(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| format!("<li><a href=\"{}\">paper</a></li>\n", href))
        .collect();
    format!(
        "<html><head><title>Archives</title></head><body><ul>\n{}</ul></body></html>",
        items
    )
}

fn paper_page(title: &str, abstract_text: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head>
        <body>
        <h1>{title}</h1>
        <pre>
@inproceedings{{nime2021_1,
  author = {{Doe, Jane}},
  title = {{{title}}},
  abstract = {{{abstract_text}}},
  year = {{2021}}
}}
        </pre>
        </body></html>"#,
        title = title,
        abstract_text = abstract_text
    )
}

/// Collects formatted log output from the current thread
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    /// Routes this thread's events into the buffer until the guard drops
    ///
    /// `#[tokio::test]` runs on a current-thread runtime, so spawned paper
    /// tasks log through the same thread-local subscriber.
    fn capture(&self) -> tracing::subscriber::DefaultGuard {
        let buffer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn lines_containing(&self, needle: &str) -> usize {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_succeeds_on_third_attempt_after_backoff() {
    let mock_server = MockServer::start().await;

    // Mounted first, so it answers the first two requests
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_http_client("TestSieve/1.0", Duration::from_secs(10)).unwrap();
    let fetcher = PageFetcher::new(client, RetryPolicy::default());

    let start = Instant::now();
    let outcome = fetcher.fetch(&format!("{}/flaky", mock_server.uri())).await;
    let elapsed = start.elapsed();

    assert_eq!(
        outcome,
        FetchOutcome::Success {
            body: "finally".to_string()
        }
    );
    assert!(
        elapsed >= Duration::from_secs(6),
        "Expected at least 2s + 4s of backoff, got {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_fetch_always_failing_gives_up_after_three_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(3, Duration::from_secs(5));
    let outcome = fetcher.fetch(&format!("{}/down", mock_server.uri())).await;

    assert_eq!(
        outcome,
        FetchOutcome::TerminalError {
            cause: TransportError::Status(500)
        }
    );
    // Wiremock verifies the expected request count when mock_server drops
}

#[tokio::test]
async fn test_fetch_success_does_not_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(3, Duration::from_secs(5));
    let outcome = fetcher.fetch(&format!("{}/ok", mock_server.uri())).await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_fetch_once_classifies_status_as_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(3, Duration::from_secs(5));
    let outcome = fetcher
        .fetch_once(&format!("{}/missing", mock_server.uri()))
        .await;
    assert_eq!(
        outcome,
        FetchOutcome::RetryableError {
            cause: TransportError::Status(404)
        }
    );
}

#[tokio::test]
async fn test_fetch_timeout_is_retried_then_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(2, Duration::from_millis(200));
    let outcome = fetcher.fetch(&format!("{}/slow", mock_server.uri())).await;
    assert_eq!(
        outcome,
        FetchOutcome::TerminalError {
            cause: TransportError::Timeout
        }
    );
}

#[tokio::test]
async fn test_fetch_connection_refused_is_terminal_after_retries() {
    // Nothing listens on port 1
    let fetcher = fast_fetcher(2, Duration::from_secs(2));
    match fetcher.fetch("http://127.0.0.1:1/gone").await {
        FetchOutcome::TerminalError { cause } => assert!(cause.is_retryable()),
        other => panic!("Expected a terminal error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_scan_match_skip_and_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/archives/",
        archive_page(&[
            "#top",
            "https://doi.org/10.5281/zenodo.123",
            "javascript:void(0)",
            "/papers/a",
            "/papers/b",
            &format!("{}/papers/c", base_url),
        ]),
    )
    .await;

    // A: abstract mentions the keyword
    mount_html(
        &mock_server,
        "/papers/a",
        paper_page(
            "Mechatronic Percussion",
            "We build instruments. The robots use mechatronic control. They are loud.",
        ),
    )
    .await;

    // B: abstract without any keyword
    mount_html(
        &mock_server,
        "/papers/b",
        paper_page("Acoustic Strings", "A purely acoustic study of strings."),
    )
    .await;

    // C: always fails
    Mock::given(method("GET"))
        .and(path("/papers/c"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let logs = LogBuffer::default();
    let _guard = logs.capture();

    let config = create_test_config(&base_url, &["mechatronic"], "/tmp");
    let coordinator = Coordinator::new(&config).expect("Failed to create coordinator");
    let report = coordinator
        .run_with_report(&config.site.archive_url)
        .await
        .expect("Scan failed");

    let failing = format!("{}/papers/c", base_url);
    assert_eq!(logs.lines_containing(&format!("Giving up on {}", failing)), 1);
    assert_eq!(logs.lines_containing(&format!("Error fetching {} on attempt", failing)), 3);
    assert_eq!(logs.lines_containing("Giving up on"), 1);

    assert_eq!(report.candidates, 3);
    assert_eq!(
        report.matches,
        vec![PaperMatch {
            title: "Mechatronic Percussion".to_string(),
            url: format!("{}/papers/a", base_url),
            matched_sentence: Some("The robots use mechatronic control.".to_string()),
        }]
    );
    assert_eq!(report.skipped, 1);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.extraction_failures, 0);
    assert_eq!(report.task_failures, 0);
}

#[tokio::test]
async fn test_run_returns_matches_as_set() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let routes = ["/p/1", "/p/2", "/p/3", "/p/4"];
    mount_html(&mock_server, "/archives/", archive_page(&routes)).await;

    mount_html(
        &mock_server,
        "/p/1",
        paper_page("One", "Mechanical keys. Nothing else."),
    )
    .await;
    mount_html(
        &mock_server,
        "/p/2",
        paper_page("Two", "First. A MECHATRONIC harp!"),
    )
    .await;
    mount_html(&mock_server, "/p/3", paper_page("Three", "Only software.")).await;
    mount_html(
        &mock_server,
        "/p/4",
        "<html><body><h1>No metadata</h1><p>mechatronic</p></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(&base_url, &["mechatronic", "mechanic"], "/tmp");
    let coordinator = Coordinator::new(&config).unwrap();
    let matches = coordinator.run(&config.site.archive_url).await.unwrap();

    let found: HashSet<PaperMatch> = matches.into_iter().collect();
    let expected: HashSet<PaperMatch> = [
        PaperMatch {
            title: "One".to_string(),
            url: format!("{}/p/1", base_url),
            matched_sentence: Some("Mechanical keys.".to_string()),
        },
        PaperMatch {
            title: "Two".to_string(),
            url: format!("{}/p/2", base_url),
            matched_sentence: Some("A MECHATRONIC harp!".to_string()),
        },
    ]
    .into_iter()
    .collect();

    assert_eq!(found, expected);
}

#[tokio::test]
async fn test_missing_title_is_isolated_extraction_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/archives/",
        archive_page(&["/p/untitled", "/p/titled"]),
    )
    .await;
    mount_html(
        &mock_server,
        "/p/untitled",
        "<html><body><pre>abstract = {A mechatronic thing.}</pre></body></html>".to_string(),
    )
    .await;
    mount_html(
        &mock_server,
        "/p/titled",
        paper_page("Titled", "Another mechatronic thing."),
    )
    .await;

    let config = create_test_config(&base_url, &["mechatronic"], "/tmp");
    let report = crawl(&config).await.unwrap();

    assert_eq!(report.extraction_failures, 1);
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].title, "Titled");
}

#[tokio::test]
async fn test_duplicate_links_are_fetched_twice() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/archives/",
        archive_page(&["/p/dup", "/p/dup"]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/p/dup"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(paper_page("Dup", "Nothing relevant.")),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &["mechatronic"], "/tmp");
    let report = crawl(&config).await.unwrap();
    assert_eq!(report.candidates, 2);
    assert_eq!(report.skipped, 2);
}

#[tokio::test]
async fn test_worker_pool_bounds_concurrency() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let routes: Vec<String> = (0..6).map(|i| format!("/slow/{}", i)).collect();
    let hrefs: Vec<&str> = routes.iter().map(String::as_str).collect();
    mount_html(&mock_server, "/archives/", archive_page(&hrefs)).await;

    for route in &routes {
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(paper_page("Slow", "Nothing here."))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;
    }

    let mut config = create_test_config(&base_url, &["mechatronic"], "/tmp");
    config.crawler.workers = 2;

    let start = Instant::now();
    let report = crawl(&config).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.skipped, 6);
    // Six 200ms requests through two workers need at least three rounds
    assert!(
        elapsed >= Duration::from_millis(600),
        "Expected at least 600ms with 2 workers, got {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_archive_failure_aborts_without_report() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/archives/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &base_url,
        &["mechatronic"],
        output_dir.path().to_str().unwrap(),
    );

    let result = crawl_and_report(&config).await;
    match result {
        Err(SieveError::ArchiveFetch { url, cause }) => {
            assert_eq!(url, config.site.archive_url);
            assert_eq!(cause, TransportError::Status(503));
        }
        other => panic!("Expected ArchiveFetch error, got {:?}", other),
    }

    assert!(!output_dir.path().join("mechatronic.csv").exists());
}

#[tokio::test]
async fn test_crawl_and_report_writes_csv() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output_dir = TempDir::new().unwrap();

    mount_html(
        &mock_server,
        "/archives/",
        archive_page(&["/p/1", "/p/2"]),
    )
    .await;
    mount_html(
        &mock_server,
        "/p/1",
        paper_page("Gear Synth", "Uses mechanical gears, and springs. Fun."),
    )
    .await;
    mount_html(&mock_server, "/p/2", paper_page("Plain", "Nothing.")).await;

    let config = create_test_config(
        &base_url,
        &["mechatronic", "mechanic"],
        output_dir.path().to_str().unwrap(),
    );

    let (report, report_path) = crawl_and_report(&config).await.unwrap();
    assert_eq!(report.matches.len(), 1);
    assert_eq!(
        report_path,
        output_dir.path().join("mechatronic_mechanic.csv")
    );

    let content = std::fs::read_to_string(&report_path).unwrap();
    let expected = format!(
        "Title,Link,Sentence with Keyword\nGear Synth,{}/p/1,\"Uses mechanical gears, and springs.\"\n",
        base_url
    );
    assert_eq!(content, expected);
}

#[tokio::test]
async fn test_empty_archive_writes_header_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output_dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/archives/", archive_page(&["#top"])).await;

    let config = create_test_config(&base_url, &["robot"], output_dir.path().to_str().unwrap());
    let (report, report_path) = crawl_and_report(&config).await.unwrap();

    assert_eq!(report.candidates, 0);
    assert!(report.matches.is_empty());
    assert_eq!(
        std::fs::read_to_string(report_path).unwrap(),
        "Title,Link,Sentence with Keyword\n"
    );
}

/// Reads the abstract from a `<p class="abstract">` paragraph instead of BibTeX
struct ParagraphExtractor;

impl AbstractExtractor for ParagraphExtractor {
    fn extract_abstract(&self, page: &str) -> Option<String> {
        let start = page.find(r#"<p class="abstract">"#)? + r#"<p class="abstract">"#.len();
        let end = start + page[start..].find("</p>")?;
        Some(page[start..end].trim().to_string())
    }

    fn extract_title(&self, page: &str) -> Result<String, ExtractionError> {
        BibtexExtractor.extract_title(page)
    }
}

#[tokio::test]
async fn test_custom_extractor_replaces_bibtex() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/archives/", archive_page(&["/p/html"])).await;
    mount_html(
        &mock_server,
        "/p/html",
        r#"<html><body><h1>Plain HTML Paper</h1>
        <p class="abstract">No BibTeX here. Just a haptic glove.</p></body></html>"#
            .to_string(),
    )
    .await;

    let config = create_test_config(&base_url, &["haptic"], "/tmp");

    let default_matches = Coordinator::new(&config)
        .unwrap()
        .run(&config.site.archive_url)
        .await
        .unwrap();
    assert!(default_matches.is_empty());

    let matches = Coordinator::new(&config)
        .unwrap()
        .with_extractor(ParagraphExtractor)
        .run(&config.site.archive_url)
        .await
        .unwrap();
    assert_eq!(
        matches,
        vec![PaperMatch {
            title: "Plain HTML Paper".to_string(),
            url: format!("{}/p/html", base_url),
            matched_sentence: Some("Just a haptic glove.".to_string()),
        }]
    );
}

/// Panics while reading any page that carries the marker
struct PanickingExtractor;

impl AbstractExtractor for PanickingExtractor {
    fn extract_abstract(&self, page: &str) -> Option<String> {
        if page.contains("EXPLODE") {
            panic!("extractor exploded");
        }
        BibtexExtractor.extract_abstract(page)
    }

    fn extract_title(&self, page: &str) -> Result<String, ExtractionError> {
        BibtexExtractor.extract_title(page)
    }
}

#[tokio::test]
async fn test_panicking_task_costs_only_its_candidate() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/archives/",
        archive_page(&["/p/boom", "/p/ok", "/p/boom", "/p/plain"]),
    )
    .await;
    mount_html(&mock_server, "/p/boom", paper_page("Boom", "EXPLODE mechatronic.")).await;
    mount_html(
        &mock_server,
        "/p/ok",
        paper_page("Survivor", "A mechatronic arm keeps going."),
    )
    .await;
    mount_html(&mock_server, "/p/plain", paper_page("Plain", "Nothing relevant.")).await;

    // One permit: every paper runs on its own task, one at a time
    let mut config = create_test_config(&base_url, &["mechatronic"], "/tmp");
    config.crawler.workers = 1;

    let report = Coordinator::new(&config)
        .unwrap()
        .with_extractor(PanickingExtractor)
        .run_with_report(&config.site.archive_url)
        .await
        .unwrap();

    assert_eq!(report.candidates, 4);
    assert_eq!(report.task_failures, 2);
    assert_eq!(report.processed(), 2);
    assert_eq!(report.attempted(), report.candidates);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        report.matches,
        vec![PaperMatch {
            title: "Survivor".to_string(),
            url: format!("{}/p/ok", base_url),
            matched_sentence: Some("A mechatronic arm keeps going.".to_string()),
        }]
    );
}
