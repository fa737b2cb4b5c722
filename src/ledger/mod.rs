//! Durable per-URL status ledger.
//!
//! The ledger records each URL's lifecycle state (pending, done with a tag,
//! or failed with a count) and persists a full snapshot after every
//! mutation, so the on-disk state never lags what callers have observed in
//! memory. A crawl interrupted at any point can resume from the snapshot.
//!
//! # Snapshot format
//!
//! One line per URL in the universe, in universe order:
//!
//! ```text
//! [X] https://example.com/page/1
//! [X5] https://example.com/page/2
//! [-3] https://example.com/page/3
//! [ ] https://example.com/page/4
//! ```
//!
//! The file is rewritten whole on every mutation; it is a snapshot, not a
//! log. Malformed lines are silently treated as absent on load, reverting
//! the URL to pending. A single writer process is assumed; concurrent
//! writers sharing one snapshot file are unsupported.
//!
//! # Example
//!
//! ```no_run
//! use pagewalk_core::ledger::Ledger;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), pagewalk_core::ledger::LedgerError> {
//! let universe = vec!["https://x/1".to_string(), "https://x/2".to_string()];
//! let mut ledger = Ledger::open(Path::new("url_status.txt"), universe)?;
//! ledger.mark_done("https://x/1", None)?;
//! assert!(ledger.is_done("https://x/1"));
//! assert_eq!(ledger.todo_urls(), vec!["https://x/2"]);
//! # Ok(())
//! # }
//! ```

mod error;
mod state;

pub use error::LedgerError;
pub use state::{format_line, parse_line, UrlState, AUTO_EXIT_TAG, DEFAULT_DONE_TAG};

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

/// Path-bound status store over the expanded URL universe.
///
/// Mutations (`mark_done`, `mark_failed`, `reset`, `clear_urls`) rewrite the
/// snapshot synchronously before returning. Queries never touch the disk.
///
/// Statuses may be held for URLs that are no longer derivable from the
/// descriptor; they keep answering queries but are not written to the
/// snapshot, which only ever lists the current universe.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    universe: Vec<String>,
    done: HashMap<String, String>,
    failed: HashMap<String, u32>,
}

impl Ledger {
    /// Opens the ledger at `path` over the given URL universe.
    ///
    /// If the snapshot file exists it is loaded tolerantly: any line that
    /// does not parse is skipped, leaving that URL pending. If the file does
    /// not exist, a fresh all-pending snapshot is written so every known URL
    /// is materialized on disk from the start.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the snapshot cannot be read or the
    /// initial snapshot cannot be written.
    #[instrument(skip(universe), fields(path = %path.display(), urls = universe.len()))]
    pub fn open(path: &Path, universe: Vec<String>) -> Result<Self, LedgerError> {
        let mut ledger = Self {
            path: path.to_path_buf(),
            universe,
            done: HashMap::new(),
            failed: HashMap::new(),
        };

        if path.exists() {
            let text =
                std::fs::read_to_string(path).map_err(|e| LedgerError::io(path, e))?;
            for line in text.lines() {
                let Some((url, state)) = parse_line(line) else {
                    continue;
                };
                match state {
                    UrlState::Pending => {}
                    UrlState::Done { tag } => {
                        ledger.done.insert(url, tag);
                    }
                    UrlState::Failed { count } => {
                        ledger.failed.insert(url, count);
                    }
                }
            }
            debug!(
                done = ledger.done.len(),
                failed = ledger.failed.len(),
                "loaded status snapshot"
            );
        } else {
            ledger.persist()?;
            debug!("materialized fresh all-pending snapshot");
        }

        Ok(ledger)
    }

    /// Returns the full URL universe in generation order.
    #[must_use]
    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    /// Returns the current state of a URL.
    #[must_use]
    pub fn state(&self, url: &str) -> UrlState {
        if let Some(tag) = self.done.get(url) {
            UrlState::Done { tag: tag.clone() }
        } else if let Some(count) = self.failed.get(url) {
            UrlState::Failed { count: *count }
        } else {
            UrlState::Pending
        }
    }

    /// Whether the URL has been successfully completed.
    #[must_use]
    pub fn is_done(&self, url: &str) -> bool {
        self.done.contains_key(url)
    }

    /// The done tag for a completed URL, if any.
    #[must_use]
    pub fn done_tag(&self, url: &str) -> Option<&str> {
        self.done.get(url).map(String::as_str)
    }

    /// Whether the URL is currently in the failed state.
    #[must_use]
    pub fn is_failed(&self, url: &str) -> bool {
        self.failed.contains_key(url)
    }

    /// Cumulative failure count for a URL; 0 if it never failed or has
    /// since succeeded.
    #[must_use]
    pub fn failure_count(&self, url: &str) -> u32 {
        self.failed.get(url).copied().unwrap_or(0)
    }

    /// Marks a URL done with the given tag (default `X`), clearing any
    /// failure record, and persists the snapshot.
    ///
    /// Re-marking an already-done URL with a different tag is allowed; there
    /// is no automatic reversion to pending. URLs outside the current
    /// universe may be marked too.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the snapshot rewrite fails.
    #[instrument(skip(self), fields(url = %url))]
    pub fn mark_done(&mut self, url: &str, tag: Option<&str>) -> Result<(), LedgerError> {
        let tag = tag.unwrap_or(DEFAULT_DONE_TAG);
        self.done.insert(url.to_string(), tag.to_string());
        self.failed.remove(url);
        self.persist()
    }

    /// Marks a URL failed, incrementing its failure count, clearing any done
    /// record, and persists the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the snapshot rewrite fails.
    #[instrument(skip(self), fields(url = %url))]
    pub fn mark_failed(&mut self, url: &str) -> Result<(), LedgerError> {
        self.done.remove(url);
        let count = self.failed.entry(url.to_string()).or_insert(0);
        *count += 1;
        self.persist()
    }

    /// URLs still needing work: everything in the universe that is not done
    /// (failed URLs are included, they are retried on later runs).
    #[must_use]
    pub fn todo_urls(&self) -> Vec<String> {
        self.universe
            .iter()
            .filter(|url| !self.is_done(url))
            .cloned()
            .collect()
    }

    /// URLs that have never completed and never failed.
    #[must_use]
    pub fn pending_urls(&self) -> Vec<String> {
        self.universe
            .iter()
            .filter(|url| !self.is_done(url) && !self.is_failed(url))
            .cloned()
            .collect()
    }

    /// Discards all statuses and rewrites a fresh all-pending snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the snapshot rewrite fails.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> Result<(), LedgerError> {
        self.done.clear();
        self.failed.clear();
        self.persist()
    }

    /// Reverts the given URLs to pending and persists the snapshot.
    ///
    /// Used by site-scoped removal: the snapshot lines remain, as `[ ]`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the snapshot rewrite fails.
    #[instrument(skip(self, urls), fields(count = urls.len()))]
    pub fn clear_urls(&mut self, urls: &[String]) -> Result<(), LedgerError> {
        for url in urls {
            self.done.remove(url);
            self.failed.remove(url);
        }
        self.persist()
    }

    /// Rewrites the full snapshot: one line per universe URL, in order.
    fn persist(&self) -> Result<(), LedgerError> {
        let mut out = String::new();
        for url in &self.universe {
            out.push_str(&format_line(url, &self.state(url)));
            out.push('\n');
        }

        let mut file =
            std::fs::File::create(&self.path).map_err(|e| LedgerError::io(&self.path, e))?;
        file.write_all(out.as_bytes())
            .map_err(|e| LedgerError::io(&self.path, e))?;
        Ok(())
    }
}
