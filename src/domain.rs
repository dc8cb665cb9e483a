//! Utility functions for handling business website URLs.

use crate::error::{AppError, Result};
use url::Url;

/// Parses a website string into a `Url`, prefixing `https://` when no scheme is given.
///
/// # Arguments
/// * `website_url_str` - The website as reported by a source (may be a bare host).
///
/// # Returns
/// * `Ok(Url)` for a parseable http(s) URL with a host.
/// * `Err(AppError::InsufficientInput)` if the input is blank.
pub(crate) fn normalize_url(website_url_str: &str) -> Result<Url> {
    let trimmed = website_url_str.trim();
    if trimmed.is_empty() {
        return Err(AppError::InsufficientInput(
            "Website URL is empty".to_string(),
        ));
    }

    let url_str_with_scheme = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&url_str_with_scheme).map_err(|e| {
        tracing::debug!(
            "Failed to parse URL '{}' (original: {}): {}",
            url_str_with_scheme,
            website_url_str,
            e
        );
        AppError::UrlParse(e)
    })?;

    if url.host_str().is_none() {
        return Err(AppError::InsufficientInput(format!(
            "Could not extract host from URL: {}",
            url_str_with_scheme
        )));
    }
    Ok(url)
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
