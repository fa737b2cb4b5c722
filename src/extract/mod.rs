//! Extraction collaborator contract and the generic selector extractor.
//!
//! The crawl core consumes extraction results only through the
//! [`Extractor`] trait: an ordered sequence of item identities pulled from a
//! saved page. Site-specific field extraction stays outside the core; the
//! bundled [`SelectorExtractor`] is a generic implementation driven by a CSS
//! selector from the descriptor.

mod store;

pub use store::IdentityStore;

use std::path::{Path, PathBuf};

use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting items from saved content.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Failed to read the saved page.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The content path that could not be read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configured CSS selector does not parse.
    #[error("invalid item selector {selector:?}")]
    Selector {
        /// The selector string that failed to parse.
        selector: String,
    },
}

/// One item discovered on a listing page.
///
/// The identity is the deduplication key for the novelty check; everything
/// else is incidental metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    /// Stable identity of the item, typically its canonical URL.
    pub identity: String,
    /// Display text captured alongside the identity, if any.
    pub title: Option<String>,
}

/// Trait all extraction collaborators implement.
pub trait Extractor: Send + Sync {
    /// Returns the extractor's name (e.g. "selector").
    fn name(&self) -> &str;

    /// Extracts the ordered item sequence from a saved page.
    ///
    /// An empty sequence is a legitimate result (an empty or exhausted
    /// listing page), not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Io`] if the content cannot be read.
    fn extract(&self, content_path: &Path) -> Result<Vec<ExtractedItem>, ExtractError>;
}

/// Default selector when the descriptor does not configure one.
pub const DEFAULT_ITEM_SELECTOR: &str = "a[href]";

/// Generic extractor: anchors matching a CSS selector become items, with the
/// resolved href (query and fragment stripped) as the identity.
pub struct SelectorExtractor {
    selector_source: String,
    selector: Selector,
}

impl SelectorExtractor {
    /// Creates an extractor for the given CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Selector`] if the selector does not parse.
    pub fn new(selector: &str) -> Result<Self, ExtractError> {
        let parsed = Selector::parse(selector).map_err(|_| ExtractError::Selector {
            selector: selector.to_string(),
        })?;
        Ok(Self {
            selector_source: selector.to_string(),
            selector: parsed,
        })
    }

    /// Returns the selector string this extractor was built from.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector_source
    }
}

impl Extractor for SelectorExtractor {
    fn name(&self) -> &str {
        "selector"
    }

    fn extract(&self, content_path: &Path) -> Result<Vec<ExtractedItem>, ExtractError> {
        let content = std::fs::read_to_string(content_path).map_err(|e| ExtractError::Io {
            path: content_path.to_path_buf(),
            source: e,
        })?;

        let base = source_url(&content);
        let document = Html::parse_document(&content);

        let mut items = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for element in document.select(&self.selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(identity) = canonical_identity(href, base.as_ref()) else {
                continue;
            };
            if !seen.insert(identity.clone()) {
                continue;
            }

            let title = {
                let text: String = element.text().collect::<String>().trim().to_string();
                (!text.is_empty()).then_some(text)
            };
            items.push(ExtractedItem { identity, title });
        }

        Ok(items)
    }
}

/// Reads the provenance comment written by the HTTP fetcher, if present.
fn source_url(content: &str) -> Option<Url> {
    let marker = "<!-- pagewalk-url: ";
    let start = content.find(marker)? + marker.len();
    let end = content[start..].find(" -->")? + start;
    Url::parse(content[start..end].trim()).ok()
}

/// Resolves an href into a canonical identity.
///
/// Relative hrefs resolve against the page's source URL; query strings and
/// fragments are stripped so session parameters do not split identities.
/// Non-http(s) and unresolvable hrefs yield `None`.
fn canonical_identity(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(href).ok()?,
        Err(_) => return None,
    };

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_query(None);
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
