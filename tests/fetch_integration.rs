//! Integration tests for the HTTP fetch collaborator.
//!
//! These tests verify outcome classification and content persistence with a
//! mock HTTP server.

use std::time::Duration;

use pagewalk_core::{FetchOutcome, Fetcher, HttpFetcher};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a mock server with a page endpoint.
async fn setup_mock_page(path_str: &str, body: &str) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_success_saves_body_with_provenance_comment() {
    let body = "<html><body><a href=\"/post/1\">Item</a></body></html>";
    let mock_server = setup_mock_page("/listing/1", body).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let fetcher = HttpFetcher::new(temp_dir.path()).expect("failed to build fetcher");
    let url = format!("{}/listing/1", mock_server.uri());
    let response = fetcher.fetch(&url).await;

    assert_eq!(response.outcome, FetchOutcome::Success);
    assert_eq!(response.status_code, 200);

    let saved = response.content_path.expect("success must carry a handle");
    let content = std::fs::read_to_string(&saved).expect("saved page should be readable");
    assert!(content.contains(body));
    assert!(
        content.starts_with(&format!("<!-- pagewalk-url: {url} -->")),
        "provenance comment missing: {content}"
    );
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new(temp_dir.path()).unwrap();
    let response = fetcher.fetch(&format!("{}/flaky", mock_server.uri())).await;

    assert_eq!(response.outcome, FetchOutcome::TransientFailure);
    assert_eq!(response.status_code, 503);
    assert!(response.content_path.is_none());
    assert!(response.error_message.unwrap().contains("503"));
}

#[tokio::test]
async fn test_client_error_is_permanent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new(temp_dir.path()).unwrap();
    let response = fetcher
        .fetch(&format!("{}/missing", mock_server.uri()))
        .await;

    assert_eq!(response.outcome, FetchOutcome::PermanentFailure);
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let fetcher =
        HttpFetcher::with_timeout(temp_dir.path(), Duration::from_millis(200)).unwrap();
    let response = fetcher.fetch(&format!("{}/slow", mock_server.uri())).await;

    assert_eq!(response.outcome, FetchOutcome::TransientFailure);
    assert_eq!(response.status_code, 0);
    assert!(response.error_message.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_connection_error_is_permanent() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new(temp_dir.path()).unwrap();

    // Nothing listens on this port.
    let response = fetcher.fetch("http://127.0.0.1:9/unreachable").await;

    assert_eq!(response.outcome, FetchOutcome::PermanentFailure);
    assert_eq!(response.status_code, 0);
}

#[tokio::test]
async fn test_unwritable_output_downgrades_success_to_permanent() {
    let mock_server = setup_mock_page("/listing/1", "<html></html>").await;
    let temp_dir = TempDir::new().unwrap();

    // A file where the output directory should be makes every write fail.
    let blocked = temp_dir.path().join("blocked");
    std::fs::write(&blocked, "file, not a directory").unwrap();

    let fetcher = HttpFetcher::new(&blocked).unwrap();
    let response = fetcher
        .fetch(&format!("{}/listing/1", mock_server.uri()))
        .await;

    assert_eq!(response.outcome, FetchOutcome::PermanentFailure);
    assert_eq!(response.status_code, 200, "fetch itself succeeded");
    assert!(
        response.error_message.unwrap().contains("save"),
        "error should mention the save failure"
    );
}

#[tokio::test]
async fn test_distinct_urls_save_to_distinct_files() {
    let mock_server = MockServer::start().await;
    for p in ["/a/1", "/a/2"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&mock_server)
            .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new(temp_dir.path()).unwrap();

    let first = fetcher.fetch(&format!("{}/a/1", mock_server.uri())).await;
    let second = fetcher.fetch(&format!("{}/a/2", mock_server.uri())).await;

    let first_path = first.content_path.unwrap();
    let second_path = second.content_path.unwrap();
    assert_ne!(first_path, second_path);
    assert!(first_path.exists());
    assert!(second_path.exists());
}
