//! CLI entry point for the pagewalk tool.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use pagewalk_core::extract::DEFAULT_ITEM_SELECTOR;
use pagewalk_core::{
    DelayPolicy, HttpFetcher, IdentityStore, Ledger, Orchestrator, RunOptions, RunReport,
    SelectorExtractor, UrlSpace,
};
use tracing::{debug, info, warn};

mod cli;
mod commands;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    // Extraction-only mode needs no descriptor: walk the directory, merge
    // identities, and exit.
    if let Some(dir) = &args.extract {
        let extractor = SelectorExtractor::new(DEFAULT_ITEM_SELECTOR)?;
        let mut store = IdentityStore::load(&args.seen_file)
            .context("failed to load identity store")?;
        let before = store.len();
        let outcome = commands::run_extract_directory(dir, &extractor, &mut store)?;
        println!(
            "Processed {} file(s): {} item(s), {} new (store: {} -> {}).",
            outcome.files,
            outcome.items,
            outcome.new_identities,
            before,
            store.len()
        );
        return Ok(());
    }

    // Load the descriptor and open the ledger over its expanded universe.
    info!(config = %args.config.display(), "loading URL-space descriptor");
    let space = UrlSpace::from_file(&args.config)?;
    let universe = space.expand_all();
    info!(
        templates = space.templates().len(),
        urls = universe.len(),
        "descriptor expanded"
    );
    let mut ledger = Ledger::open(&args.ledger, universe)?;

    if let Some(name) = &args.rm {
        let outcome = commands::run_site_removal(name, &space, &mut ledger, &args.output_dir)?;
        println!(
            "Removed site {name:?}: {} ledger entries reverted, {} saved page(s) deleted.",
            outcome.urls_cleared, outcome.files_deleted
        );
        return Ok(());
    }

    if args.reset {
        ledger.reset()?;
        println!("Workflow status reset: {} URL(s) pending.", ledger.universe().len());
        return Ok(());
    }

    if let Some(limit) = args.todo {
        let todo = ledger.todo_urls();
        let shown = limit.unwrap_or(todo.len()).min(todo.len());
        println!("URLs to process ({} remaining):", todo.len());
        for (i, url) in todo.iter().take(shown).enumerate() {
            println!("{:3}. {} {}", i + 1, ledger.state(url), url);
        }
        return Ok(());
    }

    // Build the orchestrator with the HTTP fetcher and selector extractor.
    let run_dir = args.output_dir.join(run_name());
    let fetcher = HttpFetcher::new(&run_dir).context("failed to build HTTP client")?;
    let extractor = SelectorExtractor::new(&item_selector(&space, args.site.as_deref()))?;
    let mut orchestrator =
        Orchestrator::new(space, ledger, Box::new(fetcher), Box::new(extractor));

    let summary = orchestrator.status_summary();
    if args.status {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{summary}");
        }
        return Ok(());
    }
    println!("{summary}");

    let mut store =
        IdentityStore::load(&args.seen_file).context("failed to load identity store")?;
    info!(identities = store.len(), "loaded known identities");

    let options = RunOptions {
        delay: delay_policy(&args),
        stop_on_no_new: args.stop_on_no_new(),
        max_concurrent: usize::from(args.concurrent),
    };

    // Single-URL test mode: fetch one page and report novelty counts.
    if let Some(url) = &args.url {
        let single_options = RunOptions {
            stop_on_no_new: true,
            ..options
        };
        let known = store.snapshot();
        let report = orchestrator
            .run(std::slice::from_ref(url), &single_options, &known)
            .await?;
        let new = report.new_identities.len();
        println!("Processed {url}");
        println!("Total items found: {}", report.items_seen);
        println!("New items (not duplicates): {new}");
        println!("Already existed (duplicates): {}", report.items_seen - new);
        persist_discoveries(&mut store, report)?;
        return Ok(());
    }

    // The crawl itself.
    let candidates = orchestrator.select_candidates(args.limit, args.site.as_deref());
    info!(
        candidates = candidates.len(),
        limit = ?args.limit,
        site = ?args.site,
        "selected candidates"
    );
    if candidates.is_empty() {
        println!("No URLs to process.");
        return Ok(());
    }

    let known = store.snapshot();
    let report = orchestrator.run(&candidates, &options, &known).await?;
    summarize_run(&report);
    persist_discoveries(&mut store, report)?;

    if args.auto {
        let extractor = SelectorExtractor::new(DEFAULT_ITEM_SELECTOR)?;
        let outcome = commands::run_extract_directory(&run_dir, &extractor, &mut store)?;
        println!(
            "Post-crawl extraction: {} file(s), {} item(s), {} new.",
            outcome.files, outcome.items, outcome.new_identities
        );
    }

    println!("{}", orchestrator.status_summary());

    // Partial fetch failures are recorded in the ledger and logged above;
    // the process still exits 0 so wrappers can keep re-invoking it.
    Ok(())
}

/// Picks the delay policy from CLI flags: a jitter range wins over the
/// fixed base delay.
fn delay_policy(args: &Args) -> DelayPolicy {
    match args.jitter.as_deref() {
        Some([min, max]) => DelayPolicy::range(
            Duration::from_secs_f64(min.max(0.0)),
            Duration::from_secs_f64(max.max(0.0)),
        ),
        _ => DelayPolicy::fixed(Duration::from_secs_f64(args.delay.max(0.0))),
    }
}

/// Picks the item selector: the filtered template's selector if configured,
/// otherwise the first configured selector, otherwise the default.
fn item_selector(space: &UrlSpace, site: Option<&str>) -> String {
    if let Some(name) = site {
        if let Some(selector) = space.template(name).and_then(|t| t.item_selector.clone()) {
            return selector;
        }
    }
    space
        .templates()
        .iter()
        .find_map(|t| t.item_selector.clone())
        .unwrap_or_else(|| DEFAULT_ITEM_SELECTOR.to_string())
}

/// Names the per-run content directory.
fn run_name() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("run-{seconds}")
}

/// Prints the per-run outcome block.
fn summarize_run(report: &RunReport) {
    println!(
        "Run finished: {} fetched, {} completed, {} failed{}.",
        report.attempted,
        report.completed,
        report.failed,
        if report.stopped_early {
            ", stopped early on stale content"
        } else {
            ""
        }
    );
}

/// Merges a run's discoveries into the identity store and persists it.
fn persist_discoveries(store: &mut IdentityStore, report: RunReport) -> Result<()> {
    if report.new_identities.is_empty() {
        return Ok(());
    }
    let added = store.merge(report.new_identities);
    store
        .persist()
        .context("failed to persist identity store")?;
    if added > 0 {
        info!(added, total = store.len(), "identity store updated");
    } else {
        warn!("run reported discoveries but none were new to the store");
    }
    Ok(())
}
