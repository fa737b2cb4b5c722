//! Error types for descriptor loading and validation.

use thiserror::Error;

/// Errors that can occur while loading or validating a URL-space descriptor.
#[derive(Debug, Error)]
pub enum SpaceError {
    /// Failed to read the descriptor file.
    #[error("failed to read descriptor {path}: {source}")]
    Io {
        /// The descriptor path that could not be read.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor document is not valid JSON or has the wrong shape.
    #[error("failed to parse descriptor: {0}")]
    Parse(#[from] serde_json::Error),

    /// A template declares an unsupported `type` value.
    #[error("template {name}: unsupported type {kind:?} (only \"templated\" is supported)")]
    UnsupportedKind {
        /// The offending template name.
        name: String,
        /// The declared type string.
        kind: String,
    },

    /// Two templates share the same name.
    #[error("duplicate template name: {0}")]
    DuplicateName(String),

    /// A declared variable never appears in the URL pattern.
    #[error("template {name}: variable ${var} does not appear in pattern {pattern}")]
    UnusedVariable {
        /// The offending template name.
        name: String,
        /// The declared variable name.
        var: String,
        /// The template's URL pattern.
        pattern: String,
    },

    /// The URL pattern references a placeholder with no declared variable.
    #[error("template {name}: pattern references undeclared placeholder ${var}")]
    UndeclaredPlaceholder {
        /// The offending template name.
        name: String,
        /// The undeclared placeholder name.
        var: String,
    },

    /// An increment variable has a non-positive step.
    #[error("template {name}: variable ${var} has invalid step {step} (must be >= 1)")]
    InvalidStep {
        /// The offending template name.
        name: String,
        /// The variable name.
        var: String,
        /// The declared step.
        step: i64,
    },
}

impl SpaceError {
    /// Creates an IO error with the descriptor path as context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for descriptor operations.
pub type Result<T> = std::result::Result<T, SpaceError>;
