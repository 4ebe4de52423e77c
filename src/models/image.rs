//! Resolved image data structures.

/// The line identifier used when no structured label could be extracted but
/// the page still carries the urban service keyword.
pub const UNKNOWN_LINE: &str = "unknown";

/// The fallback name token for unlabelled urban service photos.
pub const FALLBACK_NAME: &str = "urbano";

/// Structured label for an urban bus service, extracted from page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLabel {
    /// Line identifier (e.g. "A12", "INTER")
    pub line_id: String,

    /// Line display name (e.g. "Terminal Central / Jardim América")
    pub name: String,
}

impl ServiceLabel {
    /// Sentinel label for pages that mention the urban service keyword but
    /// match none of the structured patterns.
    pub fn unknown() -> Self {
        Self {
            line_id: UNKNOWN_LINE.to_string(),
            name: FALLBACK_NAME.to_string(),
        }
    }
}

/// A photo detail page resolved to its best available image URL.
///
/// Only classified pages resolve; the label is therefore never absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Absolute URL of the full-size image
    pub media_url: String,

    /// Service label extracted from the detail page
    pub label: ServiceLabel,
}

/// A resolved image with its final, page-offset-based sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    /// Ordinal used to name the output file, unique within a page
    pub sequence_index: u32,

    pub image: ResolvedImage,
}

/// How a single download attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    /// File written to disk
    Downloaded,
    /// File already existed; nothing was written
    Skipped,
    /// Transfer or write failed
    Failed,
}

/// Result of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub filename: String,
    pub status: DownloadStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_label_uses_fallback_tokens() {
        let label = ServiceLabel::unknown();
        assert_eq!(label.line_id, "unknown");
        assert_eq!(label.name, "urbano");
    }
}
