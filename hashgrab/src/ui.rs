//! Display logic for the hashgrab CLI.
//!
//! Plain result lines, plus the `--pretty` header, coloured result lines
//! and summary. Uses only the `console` crate.

use console::{pad_str, style, Alignment};
use hashgrab_lib::{GrabResult, HashAlgorithm, HashGrabError};
use std::time::Duration;

// ── Plain output ─────────────────────────────────────────────────────────────

/// Format a result as `<url> <hash>` or `couldn't fetch <url>: <error>`.
pub fn format_result(result: &GrabResult) -> String {
    match result.error() {
        None => format!("{} {}", result.url, result.hash()),
        Some(err) => format!("couldn't fetch {}: {}", result.url, err),
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(url_count: usize, concurrency: usize, hasher: HashAlgorithm) {
    println!(
        "{} {} {}",
        style("hashgrab").bold(),
        style(format!("v{}", hashgrab_lib::VERSION)).dim(),
        style(format!(
            "- Fetching {} URL{}",
            url_count,
            if url_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );
    let settings = format!("Hasher: {} | Concurrency: {}", hasher, concurrency);
    println!("{}", style(settings).dim());
    println!();
}

// ── Single result line ───────────────────────────────────────────────────────

/// Print a single result with colours and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_result(result: &GrabResult, counter: Option<(usize, usize)>) {
    let url_width = 40;
    let padded_url = pad_str(&result.url, url_width, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    match result.error() {
        None => println!(
            "  {}{}  {}",
            prefix,
            style(&padded_url).white(),
            style(result.hash()).green(),
        ),
        Some(err) => println!(
            "  {}{}  {}  {}",
            prefix,
            style(&padded_url).white(),
            style("FAILED").red().bold(),
            style(format!("{} {}", brief_error(err), err)).dim(),
        ),
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the closing summary of a pretty run.
pub fn print_summary(total: usize, hashed: usize, failed: usize, duration: Duration) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} URL{} in {:.1}s  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} hashed", hashed)).green(),
        style("|").dim(),
        style(format!("{} failed", failed)).red(),
    );
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Short category tag for a failure.
fn brief_error(err: &HashGrabError) -> &'static str {
    match err {
        HashGrabError::Timeout { .. } => "(timeout)",
        HashGrabError::Network { .. } => "(network error)",
        HashGrabError::Status { .. } => "(http status)",
        HashGrabError::Cancelled { .. } => "(cancelled)",
        HashGrabError::Hash { .. } => "(hash error)",
        _ => "(error)",
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
