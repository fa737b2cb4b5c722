//! Extraction-only mode: walk saved pages and merge item identities.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pagewalk_core::{Extractor, IdentityStore};
use tracing::{debug, warn};

/// Counts from one extraction pass over a directory.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// HTML files processed.
    pub files: usize,
    /// Items extracted in total.
    pub items: usize,
    /// Identities that were new to the store.
    pub new_identities: usize,
}

/// Runs the extractor over every saved page under `dir` (recursively) and
/// merges discovered identities into the store.
///
/// Files that fail to extract are logged and skipped; the pass keeps going.
/// The store is persisted once at the end.
pub fn run_extract_directory(
    dir: &Path,
    extractor: &dyn Extractor,
    store: &mut IdentityStore,
) -> Result<ExtractionOutcome> {
    let mut pages = Vec::new();
    collect_html_files(dir, &mut pages)
        .with_context(|| format!("failed to walk {}", dir.display()))?;
    pages.sort();

    let bar = ProgressBar::new(pages.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    let mut outcome = ExtractionOutcome::default();
    for page in &pages {
        bar.set_message(
            page.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        match extractor.extract(page) {
            Ok(items) => {
                outcome.files += 1;
                outcome.items += items.len();
                outcome.new_identities +=
                    store.merge(items.into_iter().map(|item| item.identity));
            }
            Err(e) => {
                warn!(page = %page.display(), error = %e, "extraction failed; skipping file");
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    store
        .persist()
        .context("failed to persist identity store")?;
    debug!(
        files = outcome.files,
        items = outcome.items,
        new = outcome.new_identities,
        "extraction pass complete"
    );
    Ok(outcome)
}

/// Recursively collects `.html` files under `dir`.
fn collect_html_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_html_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            out.push(path);
        }
    }
    Ok(())
}
