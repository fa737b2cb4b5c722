//! Fetch collaborator contract.
//!
//! The crawl core never performs network IO itself; it hands a URL to a
//! [`Fetcher`] and consumes the classified [`FetchResponse`]. Concrete
//! behaviors (plain HTTP, text rendering, headless browsers) are supplied by
//! the caller as interchangeable trait implementations.
//!
//! A fetch never surfaces an error type: every outcome, success or failure,
//! is folded into the response so the orchestrator can always make forward
//! progress across a batch.

mod http;

pub use http::{page_filename, HttpFetcher};

use std::path::PathBuf;

use async_trait::async_trait;

/// Classification of a completed fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was fetched (and, when applicable, persisted).
    Success,
    /// The failure will not resolve by retrying: 4xx responses, unwritable
    /// output, other unrecoverable request errors.
    PermanentFailure,
    /// The failure may resolve on a later run: timeouts and 5xx responses.
    TransientFailure,
}

impl FetchOutcome {
    /// Short lowercase label for log lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PermanentFailure => "permanent-failure",
            Self::TransientFailure => "transient-failure",
        }
    }
}

/// The classified result of fetching one URL.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL that was fetched.
    pub url: String,
    /// HTTP status code; 0 when no response was received.
    pub status_code: u16,
    /// Handle to the persisted content, present only on success.
    pub content_path: Option<PathBuf>,
    /// Outcome classification.
    pub outcome: FetchOutcome,
    /// Error description for failures.
    pub error_message: Option<String>,
}

impl FetchResponse {
    /// Creates a success response with a persisted-content handle.
    #[must_use]
    pub fn success(url: impl Into<String>, status_code: u16, content_path: PathBuf) -> Self {
        Self {
            url: url.into(),
            status_code,
            content_path: Some(content_path),
            outcome: FetchOutcome::Success,
            error_message: None,
        }
    }

    /// Creates a permanent-failure response.
    #[must_use]
    pub fn permanent(
        url: impl Into<String>,
        status_code: u16,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status_code,
            content_path: None,
            outcome: FetchOutcome::PermanentFailure,
            error_message: Some(error_message.into()),
        }
    }

    /// Creates a transient-failure response.
    #[must_use]
    pub fn transient(
        url: impl Into<String>,
        status_code: u16,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            status_code,
            content_path: None,
            outcome: FetchOutcome::TransientFailure,
            error_message: Some(error_message.into()),
        }
    }

    /// Whether this response is a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == FetchOutcome::Success
    }
}

/// Trait all fetch collaborators implement.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn Fetcher>`. Rust 2024 native async traits are not object-safe,
/// so `async_trait` is required to keep implementations interchangeable.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the fetcher's name (e.g. "http").
    fn name(&self) -> &str;

    /// Fetches one URL and classifies the result.
    async fn fetch(&self, url: &str) -> FetchResponse;
}
