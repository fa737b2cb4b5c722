//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use pagewalk_core::DEFAULT_BASE_DELAY_SECS;

/// Walk paginated listing pages and track per-page completion state.
///
/// Pagewalk expands a declarative URL-space descriptor into a concrete URL
/// list, fetches pages strictly sequentially with a jittered delay, and
/// records each URL's pending/done/failed state in a durable snapshot so
/// crawls can be resumed, retried, or stopped early on stale content.
#[derive(Parser, Debug)]
#[command(name = "pagewalk")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Maximum pages to fetch per template
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Only process URLs belonging to the named template
    #[arg(short = 's', long, value_name = "NAME")]
    pub site: Option<String>,

    /// Concurrency value; accepted for forward compatibility, fetches stay
    /// strictly sequential (1-100)
    #[arg(short = 'c', long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrent: u8,

    /// Fixed base delay between requests in seconds (±25% jitter)
    #[arg(short = 'd', long, default_value_t = DEFAULT_BASE_DELAY_SECS)]
    pub delay: f64,

    /// Uniform random delay range in seconds, overrides --delay
    #[arg(short = 'j', long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub jitter: Option<Vec<f64>>,

    /// Wipe the status snapshot back to all-pending and exit
    #[arg(long)]
    pub reset: bool,

    /// Print the status summary and exit
    #[arg(long, conflicts_with_all = ["reset", "extract", "url", "rm"])]
    pub status: bool,

    /// Emit the status summary as JSON (with --status)
    #[arg(long, requires = "status")]
    pub json: bool,

    /// List remaining URLs (optionally only the first N) and exit
    #[arg(long, value_name = "N", num_args = 0..=1)]
    pub todo: Option<Option<usize>>,

    /// Extraction-only mode: process saved pages under the directory
    #[arg(long, value_name = "DIR")]
    pub extract: Option<PathBuf>,

    /// Extract and persist item identities from the run directory after the
    /// crawl completes
    #[arg(long)]
    pub auto: bool,

    /// Stop a run once a page yields no new items (default)
    #[arg(long, conflicts_with = "no_stop")]
    pub stop_on_old: bool,

    /// Disable novelty-based early stop
    #[arg(long)]
    pub no_stop: bool,

    /// Process a single URL and report novelty counts
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Remove saved pages for the named template and revert its ledger
    /// entries to pending
    #[arg(long, value_name = "NAME")]
    pub rm: Option<String>,

    /// Path to the URL-space descriptor
    #[arg(long, value_name = "PATH", default_value = "urls.json")]
    pub config: PathBuf,

    /// Path to the status snapshot file
    #[arg(long, value_name = "PATH", default_value = "url_status.txt")]
    pub ledger: PathBuf,

    /// Root directory for saved page content
    #[arg(long, value_name = "PATH", default_value = "data/pages")]
    pub output_dir: PathBuf,

    /// Path to the known-identity store
    #[arg(long, value_name = "PATH", default_value = "seen_items.txt")]
    pub seen_file: PathBuf,
}

impl Args {
    /// Whether novelty-based early stop is in effect.
    #[must_use]
    pub fn stop_on_no_new(&self) -> bool {
        !self.no_stop
    }
}
