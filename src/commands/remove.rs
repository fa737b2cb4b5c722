//! Site-scoped data removal: drop a template's saved pages and revert its
//! ledger entries to pending.
//!
//! Page filenames derive deterministically from URLs, so the template's
//! saved content can be located by re-expanding the template and matching
//! filenames anywhere under the output root.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pagewalk_core::fetch::page_filename;
use pagewalk_core::{Ledger, UrlSpace};
use tracing::{debug, info};

/// Counts from one removal pass.
#[derive(Debug, Default)]
pub struct RemovalOutcome {
    /// Ledger entries reverted to pending.
    pub urls_cleared: usize,
    /// Saved page files deleted.
    pub files_deleted: usize,
}

/// Removes all data for the named template.
///
/// # Errors
///
/// Fails if the template does not exist, a snapshot rewrite fails, or the
/// output tree cannot be walked.
pub fn run_site_removal(
    name: &str,
    space: &UrlSpace,
    ledger: &mut Ledger,
    output_root: &Path,
) -> Result<RemovalOutcome> {
    let Some(template) = space.template(name) else {
        bail!("no template named {name:?} in the descriptor");
    };

    let urls = template.expand();
    let filenames: HashSet<String> = urls.iter().map(|url| page_filename(url)).collect();

    ledger
        .clear_urls(&urls)
        .context("failed to rewrite status snapshot")?;

    let mut outcome = RemovalOutcome {
        urls_cleared: urls.len(),
        files_deleted: 0,
    };
    delete_matching_files(output_root, &filenames, &mut outcome.files_deleted)
        .with_context(|| format!("failed to walk {}", output_root.display()))?;

    info!(
        template = name,
        urls = outcome.urls_cleared,
        files = outcome.files_deleted,
        "site data removed"
    );
    Ok(outcome)
}

/// Recursively deletes files whose names match the template's page set.
fn delete_matching_files(
    dir: &Path,
    filenames: &HashSet<String>,
    deleted: &mut usize,
) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            delete_matching_files(&path, filenames, deleted)?;
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if filenames.contains(name) {
                std::fs::remove_file(&path)?;
                debug!(path = %path.display(), "deleted saved page");
                *deleted += 1;
            }
        }
    }
    Ok(())
}
