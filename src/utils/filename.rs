// src/utils/filename.rs

//! Deterministic output filename generation.
//!
//! Filenames follow the `NNNN_slug.ext` shape: a zero-padded sequence index,
//! a slug of the service line name, and the image URL's extension.

use url::Url;

use crate::models::{FALLBACK_NAME, ServiceLabel};

/// Extension used when the image URL has none.
const DEFAULT_EXTENSION: &str = ".jpg";

/// Slugify a service line name for use in a filename.
///
/// Keeps letters (accented included), digits and underscores; collapses runs
/// of spaces, hyphens and slashes into a single underscore; drops everything
/// else; lowercases. Idempotent: `slug(slug(x)) == slug(x)`.
///
/// # Examples
/// ```
/// use buscrawl::utils::filename::slug;
///
/// assert_eq!(slug("Terminal Central / Jardim América"), "terminal_central_jardim_américa");
/// assert_eq!(slug("São João - Centro"), "são_joão_centro");
/// ```
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.chars() {
        if c == '-' || c == '/' || c.is_whitespace() {
            pending_sep = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        }
        // anything else is stripped without starting a separator
    }

    out.trim_matches('_').to_string()
}

/// Build the output filename for a resolved image.
///
/// `index` is the page-offset sequence index; the label's slugged name is
/// used unless it is absent or reduces to the fallback token, in which case
/// the literal fallback token is substituted. Pure: identical inputs always
/// produce the identical filename.
pub fn image_filename(index: u32, label: Option<&ServiceLabel>, image_url: &str) -> String {
    let ext = extension_of(image_url);
    let name = label
        .map(|l| slug(&l.name))
        .filter(|s| !s.is_empty() && s != FALLBACK_NAME)
        .unwrap_or_else(|| FALLBACK_NAME.to_string());

    format!("{index:04}_{name}{ext}")
}

/// Extract the extension (with leading dot) from the URL path, ignoring any
/// query string; falls back to `.jpg`.
fn extension_of(image_url: &str) -> String {
    let path = Url::parse(image_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| image_url.to_string());

    let file = path.rsplit('/').next().unwrap_or("");
    match file.rfind('.') {
        Some(idx) if idx > 0 => file[idx..].to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}
