//! Pisero main entry point
//!
//! This is the command-line interface for the pisero listing crawler.

use clap::Parser;
use pisero::config::load_config_with_hash;
use pisero::crawler::{Crawler, ShutdownSignal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pisero: a resumable listing crawler
///
/// Pisero walks a paginated listing catalog page by page, records every
/// discovered listing before visiting any of them, and keeps its progress
/// in SQLite so an interrupted crawl resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "pisero")]
#[command(version = "0.1.0")]
#[command(about = "A resumable listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume an interrupted crawl (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start over: clears page state, keeps captured details and the duplicate ledger
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "seed_file"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "seed_file"])]
    stats: bool,

    /// Visit listings from a JSON seed file instead of walking the catalog
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "stats"])]
    seed_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(seed_path) = cli.seed_file {
        handle_seed(config, &config_hash, cli.fresh, seed_path).await?;
    } else {
        handle_crawl(config, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pisero=info,warn"),
            1 => EnvFilter::new("pisero=debug,info"),
            2 => EnvFilter::new("pisero=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &pisero::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Pisero Dry Run ===\n");

    println!("Target site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Page URL template: {}", config.site.page_url_template);
    println!("  Listing selector: {}", config.site.listing_selector);
    println!("  Link selector: {}", config.site.link_selector);
    println!("  Detail selector: {}", config.site.detail_selector);

    println!("\nCrawler:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max attempts per navigation: {}", config.crawler.max_attempts);
    println!(
        "  Backoff: base {}ms, jitter up to {}ms",
        config.crawler.backoff_base_ms, config.crawler.backoff_jitter_ms
    );
    println!(
        "  Pause between navigations: {}-{}ms",
        config.crawler.pause_min_ms, config.crawler.pause_max_ms
    );
    println!("  Detail workers: {}", config.crawler.detail_workers);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nFirst pages to be walked:");
    for page in 1..=3 {
        println!("  {}. {}", page, config.site.page_url(page));
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &pisero::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    use pisero::output::{load_statistics, print_statistics};
    use pisero::store::open_store;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    // Open the database
    let store = open_store(Path::new(&config.output.database_path))?;

    // Load statistics
    let stats = load_statistics(&store)?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the --seed-file mode: visits an explicit list of listings once,
/// without walking the paginated catalog
async fn handle_seed(
    config: pisero::config::Config,
    config_hash: &str,
    fresh: bool,
    seed_path: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    use pisero::listing::load_seed_refs;

    let seeds = load_seed_refs(&seed_path)?;
    tracing::info!(
        "Loaded {} seed listing(s) from {}",
        seeds.len(),
        seed_path.display()
    );

    let mut crawler = Crawler::new(config, config_hash, fresh)?;
    spawn_stop_listener(crawler.shutdown_handle());

    match crawler.run_seed(seeds).await {
        Ok(summary) => {
            tracing::info!("Seed run finished: {}", summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Seed run failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: pisero::config::Config,
    config_hash: &str,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh crawl (page state cleared)");
    } else {
        tracing::info!("Starting crawl (resumes automatically if earlier state exists)");
    }

    let mut crawler = Crawler::new(config, config_hash, fresh)?;
    spawn_stop_listener(crawler.shutdown_handle());

    match crawler.run().await {
        Ok(summary) => {
            tracing::info!("Crawl finished: {}", summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Trips the crawler's stop flag on Ctrl-C so in-flight visits persist
/// before the process exits
fn spawn_stop_listener(shutdown: ShutdownSignal) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Stop requested, finishing in-flight visits");
        shutdown.trigger();
    });
}
