//! HTTP fetch collaborator backed by reqwest.
//!
//! Fetches a page with a GET request, classifies the result, and persists
//! successful bodies under the run directory. The saved path becomes the
//! content handle consumed by the extraction collaborator.
//!
//! # Classification
//!
//! | Condition                    | Outcome            |
//! |------------------------------|--------------------|
//! | 2xx, body saved              | success            |
//! | 2xx, body could not be saved | permanent-failure  |
//! | 5xx                          | transient-failure  |
//! | request timeout              | transient-failure  |
//! | 4xx                          | permanent-failure  |
//! | other request errors         | permanent-failure  |

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use url::Url;

use super::{FetchResponse, Fetcher};

/// Default request timeout; expiry surfaces as a transient failure.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Hex characters of the URL hash kept in page filenames.
const HASH_PREFIX_LEN: usize = 12;

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/pagewalk";

/// Default User-Agent for crawl requests (identifies the tool).
fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pagewalk/{version} (listing-crawler; +{PROJECT_UA_URL})")
}

/// Fetch collaborator that issues plain HTTP GET requests.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    output_dir: PathBuf,
}

impl HttpFetcher {
    /// Creates a fetcher saving page bodies under `output_dir`.
    ///
    /// The directory is created lazily on the first successful fetch.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(output_dir, DEFAULT_TIMEOUT)
    }

    /// Creates a fetcher with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn with_timeout(
        output_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(default_user_agent())
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            output_dir: output_dir.into(),
        })
    }

    /// Returns the directory page bodies are saved under.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Saves a page body, returning the written path.
    ///
    /// A provenance comment with the source URL is prepended so extractors
    /// can resolve relative links without out-of-band metadata.
    fn save_body(&self, url: &str, body: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(page_filename(url));
        std::fs::write(&path, format!("<!-- pagewalk-url: {url} -->\n{body}"))?;
        Ok(path)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> FetchResponse {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return if e.is_timeout() {
                    FetchResponse::transient(url, 0, "request timed out")
                } else {
                    FetchResponse::permanent(url, 0, e.to_string())
                };
            }
        };

        let status = response.status();
        if status.is_server_error() {
            return FetchResponse::transient(
                url,
                status.as_u16(),
                format!("server error: {}", status.as_u16()),
            );
        }
        if !status.is_success() {
            return FetchResponse::permanent(
                url,
                status.as_u16(),
                format!("client error: {}", status.as_u16()),
            );
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return if e.is_timeout() {
                    FetchResponse::transient(url, status.as_u16(), "request timed out")
                } else {
                    FetchResponse::permanent(url, status.as_u16(), e.to_string())
                };
            }
        };

        // A fetched-but-unsaved page is unusable downstream, so a write
        // failure counts as permanent even though the network call worked.
        match self.save_body(url, &body) {
            Ok(path) => {
                debug!(path = %path.display(), bytes = body.len(), "saved page body");
                FetchResponse::success(url, status.as_u16(), path)
            }
            Err(e) => FetchResponse::permanent(
                url,
                status.as_u16(),
                format!("failed to save content: {e}"),
            ),
        }
    }
}

/// Derives a stable filename for a URL: a readable slug from the path plus a
/// hash prefix so distinct URLs never collide.
#[must_use]
pub fn page_filename(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hash = String::with_capacity(HASH_PREFIX_LEN);
    for byte in digest.iter().take(HASH_PREFIX_LEN / 2) {
        hash.push_str(&format!("{byte:02x}"));
    }

    let slug = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(String::from))
        })
        .map(|segment| sanitize_slug(&segment))
        .filter(|s| !s.is_empty());

    match slug {
        Some(slug) => format!("{slug}-{hash}.html"),
        None => format!("{hash}.html"),
    }
}

/// Keeps alphanumerics, dashes, underscores, and dots; replaces the rest.
fn sanitize_slug(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_matches('.').chars().take(64).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_filename_is_stable() {
        let a = page_filename("https://example.com/models/a/1");
        let b = page_filename("https://example.com/models/a/1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_page_filename_distinct_urls_differ() {
        let a = page_filename("https://example.com/models/a/1");
        let b = page_filename("https://example.com/models/a/2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_page_filename_contains_slug() {
        let name = page_filename("https://example.com/models/page-3");
        assert!(name.starts_with("page-3-"), "unexpected name: {name}");
        assert!(name.ends_with(".html"));
    }

    #[test]
    fn test_page_filename_without_path_uses_hash_only() {
        let name = page_filename("https://example.com/");
        assert!(name.ends_with(".html"));
        assert_eq!(name.len(), HASH_PREFIX_LEN + ".html".len());
    }

    #[test]
    fn test_page_filename_sanitizes_query_like_segments() {
        let name = page_filename("https://example.com/a%20b?x=1");
        assert!(!name.contains('%'));
        assert!(!name.contains('?'));
    }

    #[test]
    fn test_user_agent_identifies_tool_and_version() {
        let ua = default_user_agent();
        assert!(ua.starts_with("pagewalk/"));
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
        assert!(ua.contains(PROJECT_UA_URL));
    }

    #[test]
    fn test_fetcher_builds_with_default_timeout() {
        let fetcher = HttpFetcher::new("/tmp/pages");
        assert!(fetcher.is_ok());
        assert_eq!(fetcher.unwrap().name(), "http");
    }
}
