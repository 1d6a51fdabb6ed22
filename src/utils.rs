//! Utility functions for filenames, log formatting, and file system checks.
//!
//! - Filesystem-safe names for downloaded thumbnails
//! - Absolute thumbnail URLs from page-relative `src` values
//! - String truncation for logging long page text
//! - Output directory validation before the browser is launched

use crate::error::Result;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Map a URL (or any string) to a filesystem-safe file name.
///
/// Takes the last non-empty `/`-separated segment and replaces each of
/// `< > : " / \ | ? *` with `_`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_filename("https://site/img:1?.jpg"), "img_1_.jpg");
/// ```
pub fn sanitize_filename(url: &str) -> String {
    let segment = url
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or_default();
    segment.replace(UNSAFE_FILENAME_CHARS, "_")
}

/// Resolve an image `src` against the page it came from.
///
/// Absolute URLs pass through unchanged. Returns `None` when either side
/// cannot be parsed.
pub fn resolve_url(base: &str, src: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(src.trim()).ok().map(String::from)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
