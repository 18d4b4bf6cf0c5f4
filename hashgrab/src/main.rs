//! Hashgrab CLI Application
//!
//! Fetches a list of URLs concurrently and prints a hash of every response
//! body as soon as it is ready. This is a thin front end over the
//! hashgrab-lib worker pool.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use futures::StreamExt;
use hashgrab_lib::{load_env_config, parse_timeout, parse_url_list, ConfigManager, EnvConfig};
use hashgrab_lib::{CancellationToken, GrabConfig, HashAlgorithm, HashGrab};
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for hashgrab
#[derive(Parser, Debug)]
#[command(name = "hashgrab")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch URLs concurrently and print a hash of each response body")]
#[command(
    long_about = "Fetch URLs concurrently and print a hash of each response body.\n\nOne line is printed per URL as soon as it completes: `<url> <hash>` on success or `couldn't fetch <url>: <error>` on failure. URLs without a scheme are fetched over http://."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// URLs to fetch
    #[arg(value_name = "URLS", help_heading = "Input")]
    pub urls: Vec<String>,

    /// Input file with URLs (one per line, '#' starts a comment)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Input"
    )]
    pub file: Option<String>,

    /// Limit the number of parallel requests (default: number of CPUs)
    #[arg(
        short = 'p',
        long = "parallel",
        value_name = "N",
        allow_negative_numbers = true,
        help_heading = "Performance"
    )]
    pub parallel: Option<i64>,

    /// Per-request timeout (e.g. "500ms", "10s", "2m")
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Hash algorithm: md5 (default) or sha256
    #[arg(long = "hasher", value_name = "ALGORITHM", help_heading = "Hashing")]
    pub hasher: Option<String>,

    /// Output one JSON object per result
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Coloured output with a header and summary
    #[arg(long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Use a specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Log progress to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Debugging")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(args.verbose);
    tracing::debug!(version = hashgrab_lib::VERSION, "hashgrab starting");

    if let Err(e) = run_hashgrab(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if let Some(parallel) = args.parallel {
        if parallel <= 0 {
            return Err("Number of parallel requests should be greater than 0".to_string());
        }
    }

    if args.urls.is_empty() && args.file.is_none() {
        return Err("Please provide at least one URL".to_string());
    }

    if args.json && args.pretty {
        return Err("Cannot use --json together with --pretty".to_string());
    }

    if let Some(hasher) = &args.hasher {
        hasher.parse::<HashAlgorithm>().map_err(|e| e.to_string())?;
    }

    if let Some(timeout) = &args.timeout {
        parse_timeout(timeout).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Send library and CLI logs to stderr so stdout only carries results.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` enables debug output for
/// hashgrab itself and everything else stays at warn.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,hashgrab=debug,hashgrab_lib=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Fetch every URL and print results as they arrive.
async fn run_hashgrab(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let urls = collect_urls(&args)?;
    if urls.is_empty() {
        return Err("Please provide at least one URL".into());
    }

    let config = build_config(&args)?;
    let grab = HashGrab::with_config(config)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    if args.pretty {
        ui::print_header(urls.len(), grab.concurrency(), grab.config().hasher);
    }

    let start_time = Instant::now();
    let mut results = grab.run_with_cancel(urls, cancel)?;
    let total = results.expected();
    let mut completed = 0usize;
    let mut failed = 0usize;

    while let Some(result) = results.next().await {
        completed += 1;
        if !result.is_success() {
            failed += 1;
        }

        if args.json {
            println!("{}", serde_json::to_string(&result)?);
        } else if args.pretty {
            let counter = (total > 1).then_some((completed, total));
            ui::print_result(&result, counter);
        } else {
            println!("{}", ui::format_result(&result));
        }
    }

    if args.pretty && total > 1 {
        println!();
        ui::print_summary(total, total - failed, failed, start_time.elapsed());
    }

    Ok(())
}

/// Cancel the run on Ctrl-C. Results for cancelled URLs are still printed.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling outstanding fetches");
            cancel.cancel();
        }
    });
}

/// Positional URLs first, then the contents of `--file`, duplicates kept.
fn collect_urls(args: &Args) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut urls = args.urls.clone();

    if let Some(file_path) = &args.file {
        let content = std::fs::read_to_string(file_path)
            .map_err(|e| format!("Failed to read URL file '{}': {}", file_path, e))?;
        let from_file = parse_url_list(&content);
        tracing::debug!(path = %file_path, count = from_file.len(), "loaded URLs from file");
        urls.extend(from_file);
    }

    Ok(urls)
}

/// Build GrabConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (HG_*)
/// 3. Config file (`--config`, then `HG_CONFIG`, otherwise discovered files)
/// 4. Built-in defaults
fn build_config(args: &Args) -> Result<GrabConfig, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    build_config_with_env(args, &env_config)
}

fn build_config_with_env(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<GrabConfig, Box<dyn std::error::Error>> {
    let mut config = GrabConfig::default();
    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: config files
    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    if let Some(path) = explicit_path {
        tracing::debug!(path = %path, "using explicit config file");
        let file_config = config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;
        config = file_config.apply_to(config)?;
    } else {
        match config_manager.discover_and_load() {
            Ok(file_config) => config = file_config.apply_to(config)?,
            Err(e) => tracing::warn!(error = %e, "config discovery failed, using defaults"),
        }
    }

    // Step 2: environment
    config = env_config.apply_to(config);

    // Step 3: CLI arguments
    apply_cli_args_to_config(config, args)
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args_to_config(
    mut config: GrabConfig,
    args: &Args,
) -> Result<GrabConfig, Box<dyn std::error::Error>> {
    if let Some(parallel) = args.parallel {
        config.concurrency = usize::try_from(parallel)
            .ok()
            .filter(|&n| n > 0)
            .ok_or("Number of parallel requests should be greater than 0")?;
    }
    if let Some(hasher) = &args.hasher {
        config.hasher = hasher.parse()?;
    }
    if let Some(timeout) = &args.timeout {
        config.timeout = parse_timeout(timeout)?;
    }
    Ok(config)
}
