//! Site-Distiller main entry point
//!
//! This is the command-line interface for the Site-Distiller pipeline.

use anyhow::Context;
use clap::Parser;
use site_distiller::config::{load_config, resolve_api_key, Config, Overrides};
use site_distiller::crawler::HttpFetcher;
use site_distiller::output::print_summary;
use site_distiller::pipeline::Coordinator;
use site_distiller::transform::ChatTransformer;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Distiller: turns a website section into transformed Markdown artifacts
///
/// Every page under the start URL is crawled, converted by a chat completions
/// service and written to `<output>/<project>/`, together with an index.
/// Pages whose artifact already exists are skipped, so an interrupted run can
/// simply be started again.
#[derive(Parser, Debug)]
#[command(name = "site-distiller")]
#[command(version)]
#[command(about = "Distills a website section into Markdown artifacts", long_about = None)]
struct Cli {
    /// First page of the section to distill
    #[arg(value_name = "START_URL")]
    start_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output root directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Project subdirectory name (defaults to the start URL host)
    #[arg(short, long)]
    project: Option<String>,

    /// Path segment to exclude from the crawl (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "SEGMENT")]
    exclude: Vec<String>,

    /// Regenerate artifacts that already exist
    #[arg(short, long)]
    force: bool,

    /// Rebuild the whole index instead of appending to it
    #[arg(long)]
    rebuild_index: bool,

    /// Maximum number of pages processed at once
    #[arg(short = 'j', long)]
    concurrency: Option<u32>,

    /// Soft cap on the number of pages discovered
    #[arg(long)]
    max_pages: Option<usize>,

    /// Model used for the transformation
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the chat completions API
    #[arg(long)]
    endpoint: Option<String>,

    /// Validate config and show what would be distilled without doing it
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            start_url: self.start_url.clone(),
            output_root: self.output.clone(),
            project: self.project.clone(),
            exclude: self.exclude.clone(),
            force: self.force,
            rebuild_index: self.rebuild_index,
            concurrency: self.concurrency,
            max_pages: self.max_pages,
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_distiller=info,warn"),
            1 => EnvFilter::new("site_distiller=debug,info"),
            2 => EnvFilter::new("site_distiller=trace,debug"),
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

async fn run(cli: Cli) -> anyhow::Result<u8> {
    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }
    let config = load_config(cli.config.as_deref(), cli.overrides())
        .context("Failed to load configuration")?;

    if cli.dry_run {
        print_plan(&config);
        return Ok(0);
    }

    let api_key = resolve_api_key(&config)?;
    let fetcher = HttpFetcher::new(&config.crawl).context("Failed to build HTTP client")?;
    let transformer = ChatTransformer::new(&config.transform, api_key)
        .context("Failed to build transformation client")?;

    let shutdown = CancellationToken::new();
    let force_stop = CancellationToken::new();
    listen_for_interrupts(shutdown.clone(), force_stop.clone());

    let coordinator = Coordinator::new(config, Box::new(fetcher), Box::new(transformer))
        .with_cancellation(shutdown, force_stop);

    let outcome = coordinator.run().await.context("Run aborted")?;

    print_summary(&outcome.report);

    if let Some(e) = &outcome.finalize_error {
        tracing::error!("Index was not written: {}", e);
    }
    if outcome.interrupted {
        tracing::warn!("Run was interrupted; start it again to pick up the remaining pages");
    }

    Ok(outcome.exit_status())
}

/// First Ctrl-C stops crawling and admission; the second abandons tasks in flight
fn listen_for_interrupts(shutdown: CancellationToken, force_stop: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::warn!("Could not listen for Ctrl-C");
            return;
        }
        tracing::warn!("Interrupt received, finishing tasks in flight (Ctrl-C again to stop now)");
        shutdown.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt received, stopping now");
            force_stop.cancel();
        }
    });
}

/// Handles the --dry-run mode: shows the effective configuration
fn print_plan(config: &Config) {
    println!("=== Site-Distiller Dry Run ===\n");

    println!("Source:");
    println!("  Start URL: {}", config.start_url);
    if config.exclude.is_empty() {
        println!("  Excluded segments: none");
    } else {
        println!("  Excluded segments: {}", config.exclude.join(", "));
    }
    match config.crawl.max_pages {
        Some(limit) => println!("  Page limit: {}", limit),
        None => println!("  Page limit: none"),
    }

    println!("\nOutput:");
    println!("  Project directory: {}", config.project_dir().display());
    println!("  Force regenerate: {}", config.force);
    println!("  Index mode: {:?}", config.index_mode);

    println!("\nProcessing:");
    println!("  Concurrency: {}", config.concurrency);
    println!(
        "  Chunking: {} chars, {} lookback, {} overlap",
        config.chunking.threshold, config.chunking.lookback, config.chunking.overlap
    );
    println!("  Model: {} at {}", config.transform.model, config.transform.endpoint);

    println!("\n✓ Configuration is valid");
}
