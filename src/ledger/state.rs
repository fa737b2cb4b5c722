//! Per-URL lifecycle states and the snapshot line codec.

use std::fmt;

/// Tag recorded for a plain successful fetch.
pub const DEFAULT_DONE_TAG: &str = "X";

/// Tag marking the URL where novelty-based early termination occurred.
pub const AUTO_EXIT_TAG: &str = "AUTOEXIT";

/// Lifecycle state of a single URL.
///
/// A URL is in exactly one state at any time. `Pending` is the implicit
/// default: absence from the done and failed maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlState {
    /// Never successfully fetched and not currently failed.
    Pending,
    /// Successfully fetched. The tag may carry metadata, e.g. `X5` for five
    /// novel items or `AUTOEXIT` for the early-termination marker.
    Done {
        /// Status tag as written inside the brackets.
        tag: String,
    },
    /// Fetch failed `count` times without an intervening success.
    Failed {
        /// Cumulative failure count; always at least 1.
        count: u32,
    },
}

impl UrlState {
    /// Convenience constructor for a default done state.
    #[must_use]
    pub fn done() -> Self {
        Self::Done {
            tag: DEFAULT_DONE_TAG.to_string(),
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "[ ]"),
            Self::Done { tag } => write!(f, "[{tag}]"),
            Self::Failed { count } => write!(f, "[-{count}]"),
        }
    }
}

/// Formats one snapshot line for a URL in the given state.
#[must_use]
pub fn format_line(url: &str, state: &UrlState) -> String {
    format!("{state} {url}")
}

/// Parses one snapshot line into a URL and its state.
///
/// Returns `None` for blank or malformed lines; the caller treats those as
/// absent, which makes the URL revert to pending. Recognized forms:
///
/// ```text
/// [X] url        [X5] url       [AUTOEXIT] url
/// [-3] url       [ ] url
/// ```
#[must_use]
pub fn parse_line(line: &str) -> Option<(String, UrlState)> {
    let line = line.trim();
    if line.is_empty() || !line.starts_with('[') {
        return None;
    }

    let close = line.find(']')?;
    let tag = &line[1..close];
    let url = line[close + 1..].trim();
    if url.is_empty() {
        return None;
    }

    let state = if tag == " " || tag.is_empty() {
        UrlState::Pending
    } else if tag.starts_with('X') || tag == AUTO_EXIT_TAG {
        UrlState::Done {
            tag: tag.to_string(),
        }
    } else if let Some(count) = tag.strip_prefix('-') {
        let count: u32 = count.parse().ok()?;
        if count == 0 {
            return None;
        }
        UrlState::Failed { count }
    } else {
        return None;
    };

    Some((url.to_string(), state))
}
