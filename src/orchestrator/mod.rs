//! Crawl orchestration: candidate selection, pacing, and the run loop.
//!
//! The orchestrator owns the descriptor, the status ledger, and the two
//! collaborators (fetch and extraction). A run walks candidates strictly
//! sequentially, one fetch in flight at a time, funneling every outcome into
//! a ledger mutation so an interrupted run resumes from a consistent
//! snapshot.
//!
//! With novelty-based early stop enabled, each successful page is handed to
//! the extraction collaborator; once a page yields nothing new the run ends
//! and the next candidate is tagged `AUTOEXIT` without being fetched. This
//! leans on the monotonic-frontier assumption: listing pages are ordered so
//! that once one page is stale, later pages are too.

mod delay;

pub use delay::{DelayPolicy, DEFAULT_BASE_DELAY_SECS};

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::extract::Extractor;
use crate::fetch::{FetchOutcome, Fetcher};
use crate::ledger::{Ledger, LedgerError, AUTO_EXIT_TAG};
use crate::space::UrlSpace;

/// Options governing a single `run` invocation.
pub struct RunOptions {
    /// Delay policy applied before each fetch except the first.
    pub delay: DelayPolicy,
    /// Enables the novelty check and early termination.
    pub stop_on_no_new: bool,
    /// Accepted for forward compatibility; fetches remain strictly
    /// sequential regardless of this value.
    pub max_concurrent: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            delay: DelayPolicy::default(),
            stop_on_no_new: false,
            max_concurrent: 1,
        }
    }
}

/// Outcome counters and discoveries from one `run` invocation.
#[derive(Debug, Default)]
pub struct RunReport {
    /// URLs actually fetched.
    pub attempted: usize,
    /// URLs marked done.
    pub completed: usize,
    /// URLs marked failed.
    pub failed: usize,
    /// Total items extracted across the run (novelty runs only).
    pub items_seen: usize,
    /// Identities discovered this run that were not previously known.
    pub new_identities: Vec<String>,
    /// Whether the novelty check terminated the run early.
    pub stopped_early: bool,
}

/// Counts over the full generated URL set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    /// Size of the URL universe.
    pub total: usize,
    /// URLs marked done.
    pub done: usize,
    /// URLs currently failed.
    pub failed: usize,
    /// URLs never completed and never failed.
    pub pending: usize,
    /// Completion percentage (0.0 for an empty universe).
    pub progress_percent: f64,
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "URL processing status:")?;
        writeln!(f, "  Total URLs:     {}", self.total)?;
        writeln!(f, "  Completed [X]:  {}", self.done)?;
        writeln!(f, "  Pending [ ]:    {}", self.pending)?;
        writeln!(f, "  Failed [-N]:    {}", self.failed)?;
        writeln!(f, "  Remaining:      {}", self.pending + self.failed)?;
        write!(f, "  Progress:       {:.1}%", self.progress_percent)
    }
}

/// Drives the end-to-end crawl loop over a descriptor and its ledger.
pub struct Orchestrator {
    space: UrlSpace,
    ledger: Ledger,
    fetcher: Box<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
}

impl Orchestrator {
    /// Creates an orchestrator from its parts.
    #[must_use]
    pub fn new(
        space: UrlSpace,
        ledger: Ledger,
        fetcher: Box<dyn Fetcher>,
        extractor: Box<dyn Extractor>,
    ) -> Self {
        Self {
            space,
            ledger,
            fetcher,
            extractor,
        }
    }

    /// Returns the descriptor.
    #[must_use]
    pub fn space(&self) -> &UrlSpace {
        &self.space
    }

    /// Returns the ledger.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Returns the ledger mutably (reset, site-scoped clearing).
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Selects the URLs to fetch next.
    ///
    /// Starts from `todo_urls()` (everything not done, in generation order).
    /// A template filter restricts candidates to that template, membership
    /// determined by re-deriving each template's URL set. A per-template
    /// limit groups candidates by owning template and keeps only the first
    /// `limit` of each group in generation order before flattening; the
    /// result stays grouped by template in declaration order.
    #[must_use]
    pub fn select_candidates(
        &self,
        limit_per_template: Option<usize>,
        template_filter: Option<&str>,
    ) -> Vec<String> {
        let todo = self.ledger.todo_urls();
        if limit_per_template.is_none() && template_filter.is_none() {
            return todo;
        }

        let todo_set: HashSet<&str> = todo.iter().map(String::as_str).collect();
        let mut owned: HashSet<String> = HashSet::new();
        let mut selected = Vec::new();

        for template in self.space.templates() {
            let urls = template.expand();
            let matches_filter =
                template_filter.is_none_or(|filter| template.name == filter);

            if matches_filter {
                let mut group: Vec<String> = urls
                    .iter()
                    .filter(|url| todo_set.contains(url.as_str()))
                    .cloned()
                    .collect();
                if let Some(limit) = limit_per_template {
                    group.truncate(limit);
                }
                selected.extend(group);
            }

            owned.extend(urls);
        }

        // Statuses can outlive the descriptor; candidates no template owns
        // form a trailing group under the same limit.
        if template_filter.is_none() {
            let mut rest: Vec<String> = todo
                .iter()
                .filter(|url| !owned.contains(*url))
                .cloned()
                .collect();
            if let Some(limit) = limit_per_template {
                rest.truncate(limit);
            }
            selected.extend(rest);
        }

        selected
    }

    /// Walks the candidates strictly sequentially, updating the ledger after
    /// every fetch.
    ///
    /// Before each URL except the first, sleeps per the delay policy. Every
    /// fetch outcome becomes a ledger mutation: success marks done, both
    /// failure kinds mark failed and the loop continues. A single bad URL
    /// never aborts the batch, and there is no in-run retry; rerunning the
    /// crawl is the retry mechanism.
    ///
    /// With `stop_on_no_new`, each success is extracted and scored against
    /// `known` plus the identities discovered earlier in this run. The done
    /// tag encodes the novelty count (`X<count>`); a count of zero ends the
    /// run and tags the next candidate `AUTOEXIT` without fetching it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] only when a ledger snapshot rewrite fails;
    /// fetch and extraction problems never escape as errors.
    #[instrument(skip(self, candidates, options, known), fields(candidates = candidates.len()))]
    pub async fn run(
        &mut self,
        candidates: &[String],
        options: &RunOptions,
        known: &HashSet<String>,
    ) -> Result<RunReport, LedgerError> {
        let mut report = RunReport::default();
        let mut seen = known.clone();

        if options.max_concurrent > 1 {
            debug!(
                max_concurrent = options.max_concurrent,
                "concurrency value accepted but not honored; fetches stay sequential"
            );
        }

        for (index, url) in candidates.iter().enumerate() {
            if index > 0 {
                let delay = options.delay.next_delay();
                debug!(delay_ms = delay.as_millis(), "pausing before next request");
                tokio::time::sleep(delay).await;
            }

            info!(url = %url, "fetching");
            let response = self.fetcher.fetch(url).await;
            report.attempted += 1;

            match response.outcome {
                FetchOutcome::Success => {
                    if options.stop_on_no_new {
                        let stop = self.score_novelty(url, &response, &mut seen, &mut report)?;
                        if stop {
                            report.stopped_early = true;
                            if let Some(next) = candidates.get(index + 1) {
                                self.ledger.mark_done(next, Some(AUTO_EXIT_TAG))?;
                                info!(url = %next, "marked auto-exit boundary");
                            }
                            break;
                        }
                    } else {
                        self.ledger.mark_done(url, None)?;
                        report.completed += 1;
                    }
                }
                FetchOutcome::PermanentFailure | FetchOutcome::TransientFailure => {
                    self.ledger.mark_failed(url)?;
                    report.failed += 1;
                    warn!(
                        url = %url,
                        status = response.status_code,
                        outcome = response.outcome.label(),
                        error = response.error_message.as_deref().unwrap_or("unknown"),
                        failures = self.ledger.failure_count(url),
                        "fetch failed"
                    );
                }
            }
        }

        info!(
            attempted = report.attempted,
            completed = report.completed,
            failed = report.failed,
            new_items = report.new_identities.len(),
            stopped_early = report.stopped_early,
            "run finished"
        );
        Ok(report)
    }

    /// Extracts a fetched page, tags the URL with its novelty count, and
    /// reports whether the run should stop.
    ///
    /// Zero novelty stops the run whether the page held no items at all or
    /// only already-known ones. An unreadable page or missing content handle
    /// falls back to a plain done mark and keeps the run going.
    fn score_novelty(
        &mut self,
        url: &str,
        response: &crate::fetch::FetchResponse,
        seen: &mut HashSet<String>,
        report: &mut RunReport,
    ) -> Result<bool, LedgerError> {
        let items = match response.content_path.as_deref() {
            Some(path) => match self.extractor.extract(path) {
                Ok(items) => items,
                Err(e) => {
                    warn!(url = %url, error = %e, "extraction failed; skipping novelty check");
                    self.ledger.mark_done(url, None)?;
                    report.completed += 1;
                    return Ok(false);
                }
            },
            None => {
                self.ledger.mark_done(url, None)?;
                report.completed += 1;
                return Ok(false);
            }
        };

        report.items_seen += items.len();
        let new: Vec<String> = items
            .iter()
            .filter(|item| !seen.contains(&item.identity))
            .map(|item| item.identity.clone())
            .collect();
        let novelty = new.len();

        self.ledger.mark_done(url, Some(&format!("X{novelty}")))?;
        report.completed += 1;
        info!(url = %url, items = items.len(), new_items = novelty, "scored page");

        if novelty == 0 {
            if items.is_empty() {
                info!(url = %url, "page yielded no items; stopping early");
            } else {
                info!(url = %url, "no new items on page; stopping early");
            }
            return Ok(true);
        }

        seen.extend(new.iter().cloned());
        report.new_identities.extend(new);
        Ok(false)
    }

    /// Computes counts over the full generated URL set.
    #[must_use]
    pub fn status_summary(&self) -> StatusSummary {
        let universe = self.ledger.universe();
        let total = universe.len();
        let done = universe.iter().filter(|u| self.ledger.is_done(u)).count();
        let failed = universe.iter().filter(|u| self.ledger.is_failed(u)).count();
        let pending = total - done - failed;

        #[allow(clippy::cast_precision_loss)]
        let progress_percent = if total == 0 {
            0.0
        } else {
            done as f64 / total as f64 * 100.0
        };

        StatusSummary {
            total,
            done,
            failed,
            pending,
            progress_percent,
        }
    }
}
