//! Candidate link extraction service.
//!
//! Scans a gallery page for anchor-wrapped thumbnails and filters out
//! obvious non-photo links (chrome assets, tiny images, pagination).

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{CandidateLink, FilterConfig};
use crate::utils::resolve_url;

/// Service for extracting candidate photo links from gallery pages.
pub struct LinkExtractor {
    min_dimension: u32,
    exclude_keywords: Vec<String>,
    pagination_markers: Vec<String>,
    anchors: Selector,
    images: Selector,
}

impl LinkExtractor {
    /// Create a new extractor from the filter configuration.
    pub fn from_config(filters: &FilterConfig) -> Self {
        Self {
            min_dimension: filters.min_dimension,
            exclude_keywords: filters.exclude_keywords.clone(),
            pagination_markers: filters.pagination_markers.clone(),
            anchors: Selector::parse("a").expect("anchor selector"),
            images: Selector::parse("img").expect("image selector"),
        }
    }

    /// Extract candidate links in document order.
    ///
    /// Duplicates are kept; `position` reflects the candidate's rank among
    /// the accepted links.
    pub fn extract(&self, document: &Html, page_url: &Url) -> Vec<CandidateLink> {
        let mut candidates = Vec::new();

        for anchor in document.select(&self.anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(img) = anchor.select(&self.images).next() else {
                continue;
            };

            let full_url = resolve_url(page_url, href);
            if self.is_valid_photo_link(&full_url, &img) {
                candidates.push(CandidateLink {
                    url: full_url,
                    origin_page: page_url.to_string(),
                    position: candidates.len(),
                });
            }
        }

        candidates
    }

    /// Apply the rejection rules; first match rejects.
    fn is_valid_photo_link(&self, url: &str, img: &ElementRef) -> bool {
        let url_lower = url.to_lowercase();

        // Tiny declared dimensions mark thumbnails of chrome, not photos.
        // Malformed or missing dimensions are treated as no constraint.
        if let (Some(w), Some(h)) = (img.value().attr("width"), img.value().attr("height")) {
            if let (Ok(w), Ok(h)) = (w.parse::<u32>(), h.parse::<u32>()) {
                if w < self.min_dimension || h < self.min_dimension {
                    return false;
                }
            }
        }

        if self.exclude_keywords.iter().any(|k| url_lower.contains(k)) {
            return false;
        }

        if self.pagination_markers.iter().any(|m| url_lower.contains(m)) {
            return false;
        }

        true
    }
}
