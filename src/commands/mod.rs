//! CLI command handlers for the non-crawl modes.

mod extract;
mod remove;

pub use extract::{run_extract_directory, ExtractionOutcome};
pub use remove::{run_site_removal, RemovalOutcome};
