//! Known-identity store backing the novelty check.
//!
//! A plain text file, one identity per line, loaded tolerantly and rewritten
//! whole on persist. This is the external known-identity set the
//! orchestrator consults when deciding whether a page yielded anything new.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

/// File-backed set of item identities in first-seen order.
#[derive(Debug)]
pub struct IdentityStore {
    path: PathBuf,
    order: Vec<String>,
    known: HashSet<String>,
}

impl IdentityStore {
    /// Loads the store from `path`; a missing file yields an empty store.
    ///
    /// Blank lines are skipped and duplicates collapse to the first
    /// occurrence.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if an existing file cannot be read.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let mut store = Self {
            path: path.to_path_buf(),
            order: Vec::new(),
            known: HashSet::new(),
        };

        if path.exists() {
            let text = std::fs::read_to_string(path)?;
            for line in text.lines() {
                let identity = line.trim();
                if identity.is_empty() {
                    continue;
                }
                if store.known.insert(identity.to_string()) {
                    store.order.push(identity.to_string());
                }
            }
            debug!(identities = store.order.len(), "loaded identity store");
        }

        Ok(store)
    }

    /// Whether an identity is already known.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.known.contains(identity)
    }

    /// Number of known identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the known identities as a set snapshot.
    #[must_use]
    pub fn snapshot(&self) -> HashSet<String> {
        self.known.clone()
    }

    /// Merges identities into the store, returning how many were new.
    ///
    /// In-memory only; call [`IdentityStore::persist`] to write the file.
    pub fn merge<I>(&mut self, identities: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for identity in identities {
            if identity.is_empty() {
                continue;
            }
            if self.known.insert(identity.clone()) {
                self.order.push(identity);
                added += 1;
            }
        }
        added
    }

    /// Rewrites the store file, one identity per line in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the file cannot be written.
    pub fn persist(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::fs::File::create(&self.path)?;
        for identity in &self.order {
            writeln!(file, "{identity}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = IdentityStore::load(&dir.path().join("seen.txt")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_counts_only_new_identities() {
        let dir = TempDir::new().unwrap();
        let mut store = IdentityStore::load(&dir.path().join("seen.txt")).unwrap();

        let added = store.merge(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(added, 2);

        let added = store.merge(vec!["b".to_string(), "c".to_string()]);
        assert_eq!(added, 1);
        assert_eq!(store.len(), 3);
        assert!(store.contains("a"));
        assert!(store.contains("c"));
    }

    #[test]
    fn test_persist_round_trip_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.txt");
        {
            let mut store = IdentityStore::load(&path).unwrap();
            store.merge(vec!["z".to_string(), "a".to_string(), "m".to_string()]);
            store.persist().unwrap();
        }

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "z\na\nm\n");

        let reloaded = IdentityStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert!(reloaded.contains("m"));
    }

    #[test]
    fn test_load_skips_blank_lines_and_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen.txt");
        std::fs::write(&path, "a\n\n  \na\nb\n").unwrap();

        let store = IdentityStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
    }
}
