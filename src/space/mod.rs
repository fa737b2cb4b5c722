//! URL-space descriptor: named templates and their deterministic expansion.
//!
//! A descriptor is a declarative document listing URL templates. Each
//! template owns a URL pattern with `$name` placeholders and an ordered set
//! of variable specifications ([`VariableSpec`]). Expanding the descriptor
//! yields the complete crawl universe: each template's Cartesian product in
//! declaration order, concatenated in template order.
//!
//! Expansion is pure and deterministic; the ledger relies on it to rebuild
//! the same URL universe on every run.
//!
//! # Example
//!
//! ```
//! use pagewalk_core::space::UrlSpace;
//!
//! let space = UrlSpace::from_json_str(
//!     r#"{"urls": [{
//!         "name": "t",
//!         "url": "https://x/$p",
//!         "type": "templated",
//!         "template_vars": {"p": {"type": "increment", "start": 1, "end": 3}}
//!     }]}"#,
//! ).unwrap();
//! assert_eq!(space.expand_all(), vec!["https://x/1", "https://x/2", "https://x/3"]);
//! ```

mod error;
mod template;

pub use error::SpaceError;
pub use template::{UrlTemplate, VariableSpec};

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

/// Matches `$name` placeholder tokens in URL patterns.
#[allow(clippy::unwrap_used)] // the pattern is a literal
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

/// The declarative URL-space descriptor: an ordered list of templates.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlSpace {
    /// Templates in declaration order.
    #[serde(rename = "urls")]
    templates: Vec<UrlTemplate>,
}

impl UrlSpace {
    /// Loads and validates a descriptor from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::Io`] if the file cannot be read,
    /// [`SpaceError::Parse`] if the document is malformed, or a validation
    /// error for unsupported kinds, duplicate names, placeholder mismatches,
    /// or invalid steps.
    pub fn from_file(path: &Path) -> Result<Self, SpaceError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SpaceError::io(path.display().to_string(), e))?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a descriptor from a JSON string.
    ///
    /// # Errors
    ///
    /// Same validation rules as [`UrlSpace::from_file`].
    pub fn from_json_str(text: &str) -> Result<Self, SpaceError> {
        let space: Self = serde_json::from_str(text)?;
        space.validate()?;
        Ok(space)
    }

    /// Returns the templates in declaration order.
    #[must_use]
    pub fn templates(&self) -> &[UrlTemplate] {
        &self.templates
    }

    /// Looks up a template by name.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&UrlTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Expands every template into the full ordered URL universe.
    ///
    /// Template order follows declaration order; within a template the last
    /// declared placeholder varies fastest. Pure function: identical input
    /// produces identical output and ordering on every invocation.
    #[must_use]
    pub fn expand_all(&self) -> Vec<String> {
        let mut urls = Vec::new();
        for template in &self.templates {
            urls.extend(template.expand());
        }
        urls
    }

    /// Checks structural rules the document shape alone cannot express.
    fn validate(&self) -> Result<(), SpaceError> {
        let mut seen_names = HashSet::new();
        for template in &self.templates {
            if template.kind != "templated" {
                return Err(SpaceError::UnsupportedKind {
                    name: template.name.clone(),
                    kind: template.kind.clone(),
                });
            }

            if !seen_names.insert(template.name.as_str()) {
                return Err(SpaceError::DuplicateName(template.name.clone()));
            }

            let referenced: HashSet<&str> = placeholder_regex()
                .captures_iter(&template.pattern)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .collect();

            for (var, spec) in &template.variables {
                if !referenced.contains(var.as_str()) {
                    return Err(SpaceError::UnusedVariable {
                        name: template.name.clone(),
                        var: var.clone(),
                        pattern: template.pattern.clone(),
                    });
                }
                let step = spec.step();
                if step < 1 {
                    return Err(SpaceError::InvalidStep {
                        name: template.name.clone(),
                        var: var.clone(),
                        step,
                    });
                }
            }

            let declared: HashSet<&str> = template
                .variables
                .iter()
                .map(|(name, _)| name.as_str())
                .collect();
            for var in &referenced {
                if !declared.contains(var) {
                    return Err(SpaceError::UndeclaredPlaceholder {
                        name: template.name.clone(),
                        var: (*var).to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
