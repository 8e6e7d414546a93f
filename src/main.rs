//! Sitelens main entry point
//!
//! This is the command-line interface for the Sitelens SEO audit engine.

use clap::Parser;
use sitelens::cache::SqliteCache;
use sitelens::config::{load_config, Config};
use sitelens::crawler::Orchestrator;
use sitelens::page::AuditOutcome;
use sitelens::score::page_score;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sitelens: a crawl-and-audit SEO engine
///
/// Sitelens crawls a website while respecting robots.txt and per-host rate
/// limits, audits every page against a deterministic SEO rule set, and
/// produces page and site scores.
#[derive(Parser, Debug)]
#[command(name = "sitelens")]
#[command(version)]
#[command(about = "Crawl a website and audit its SEO", long_about = None)]
struct Cli {
    /// Seed URL to audit
    #[arg(value_name = "URL")]
    url: String,

    /// Target keyword the site should rank for
    #[arg(short, long)]
    keyword: String,

    /// Maximum number of pages to analyze
    #[arg(long, default_value_t = 10)]
    max_pages: usize,

    /// Discover URLs from sitemaps before crawling
    #[arg(long)]
    whole_site: bool,

    /// Also take a search-results snapshot for the keyword
    #[arg(long)]
    serp: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Sweep expired entries from the cache and exit
    #[arg(long, conflicts_with_all = ["whole_site", "serp"])]
    cleanup_cache: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if cli.cleanup_cache {
        return handle_cleanup(&config);
    }

    let orchestrator = Orchestrator::new(config)?;

    let outcome = orchestrator
        .analyze_website(&cli.url, &cli.keyword, cli.max_pages, cli.whole_site)
        .await?;
    print_outcome(&outcome);

    if cli.serp {
        let results = orchestrator.serp_snapshot(&cli.keyword).await?;
        print_serp(&cli.keyword, &results);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitelens=info,warn"),
            1 => EnvFilter::new("sitelens=debug,info"),
            2 => EnvFilter::new("sitelens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --cleanup-cache mode: runs the retention sweep and exits
fn handle_cleanup(config: &Config) -> anyhow::Result<()> {
    println!("Cache database: {}", config.cache.database_path);
    let cache = SqliteCache::new(Path::new(&config.cache.database_path))?;
    let removed = cache.cleanup(config.cache.cleanup_days)?;
    println!(
        "✓ Removed {} entries older than {} days",
        removed, config.cache.cleanup_days
    );
    Ok(())
}

fn print_outcome(outcome: &AuditOutcome) {
    println!("=== Sitelens Audit Report ===\n");

    for record in &outcome.pages {
        println!("{} — score {:.1}", record.url, page_score(record));
        println!(
            "  {} words, {:.2}s load, {} internal / {} external links",
            record.word_count,
            record.load_time_secs,
            record.internal_links.len(),
            record.external_links.len()
        );
        for issue in &record.seo_issues {
            println!("  [{}] {}", issue.category, issue.description);
        }
        println!();
    }

    let stats = &outcome.stats;
    println!("Pages analyzed:   {}", stats.successful_pages);
    println!("  from cache:     {}", stats.cached_pages);
    println!("  failed:         {}", stats.failed_pages);
    println!("  skipped:        {}", stats.skipped_pages);
    println!("Total issues:     {}", stats.total_issues);
    println!("Bytes fetched:    {}", stats.total_bytes_transferred);
    println!("Duration:         {:.1}s", stats.crawl_duration_secs);
    println!("Avg load time:    {:.2}s", stats.average_load_time_secs);
    println!("\nSite score: {:.1} / 100", outcome.site_score);
}

fn print_serp(keyword: &str, results: &[sitelens::serp::SerpResult]) {
    println!("\n=== Search Results Snapshot: \"{}\" ===\n", keyword);
    if results.is_empty() {
        println!("No results parsed.");
        return;
    }
    for result in results {
        println!("{:>2}. {} ({})", result.rank, result.title, result.domain);
        println!("    {}", result.url);
        if let Some(snippet) = &result.snippet {
            println!("    {}", snippet);
        }
    }
}
