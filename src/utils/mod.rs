//! Utility functions and helpers.

pub mod filename;
pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Check whether a URL carries one of the recognized image extensions.
pub fn has_image_extension(url: &str, extensions: &[String]) -> bool {
    let lower = url.to_lowercase();
    extensions.iter().any(|ext| lower.contains(ext.as_str()))
}
