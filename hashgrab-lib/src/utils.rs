//! Utility functions for URL handling and input parsing.

use crate::error::HashGrabError;
use crate::Result;
use std::time::Duration;

/// Scheme prepended to URLs that carry none.
pub const DEFAULT_SCHEME: &str = "http://";

/// Apply the default-scheme rule.
///
/// URLs starting with `http://` or `https://` are returned unchanged;
/// anything else gets `http://` prepended. No other validation happens here,
/// a malformed URL fails later inside the fetcher.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, url)
    }
}

/// Parse a duration string like "5", "5s", "2m" or "1500ms".
///
/// A bare number is read as seconds. Zero and values too large for a
/// `Duration` are rejected.
pub fn parse_timeout(input: &str) -> Result<Duration> {
    let value = input.trim().to_lowercase();
    let invalid = || HashGrabError::config(format!("invalid timeout '{}'", input.trim()));

    let duration = if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
    .ok_or_else(invalid)?;

    if duration.is_zero() {
        return Err(invalid());
    }
    Ok(duration)
}

/// Parse a URL list: one URL per line.
///
/// Blank lines and lines starting with `#` are skipped, and anything after
/// whitespace followed by `#` is dropped. Order and duplicates are preserved.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| strip_inline_comment(line.trim()))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Cut a line at the first `#` that follows whitespace. A `#` glued to the
/// URL is a fragment and stays.
fn strip_inline_comment(line: &str) -> &str {
    let comment = line
        .char_indices()
        .find(|&(idx, c)| c == '#' && line[..idx].ends_with(char::is_whitespace));
    match comment {
        Some((idx, _)) => line[..idx].trim_end(),
        None => line,
    }
}

/// Number of processing units available to this process, at least 1.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
