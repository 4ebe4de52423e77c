//! Image URL resolution service.
//!
//! Given a photo detail page, fetches and classifies it, then runs an
//! ordered cascade of extraction strategies to find the best available
//! image URL. Each strategy is a pure function over the parsed page; the
//! first one to produce a URL wins.

use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{CrawlerConfig, FilterConfig, ResolvedImage};
use crate::services::ServiceClassifier;
use crate::utils::{has_image_extension, resolve_url};
use crate::utils::http::fetch_page;

/// Tokens that mark a script-embedded URL as the full-size variant.
const SIZE_HINTS: [&str; 3] = ["large", "full", "original"];

/// Lightbox/gallery attribute references, probed before anything else.
const LIGHTBOX_SELECTORS: [&str; 4] = [
    "img[data-lightbox]",
    "img[data-fancybox]",
    "a[data-lightbox] img",
    "a[data-fancybox] img",
];

/// Designated main-image containers, in priority order.
const MAIN_IMAGE_SELECTORS: [&str; 9] = [
    "img.main-image",
    "img.large-image",
    "img.full-size",
    ".image-container img",
    ".main-content img",
    ".photo-view img",
    r#"img[src*="large"]"#,
    r#"img[src*="full"]"#,
    r#"img[src*="original"]"#,
];

/// Anchors that advertise a full-size download.
const DOWNLOAD_SELECTORS: [&str; 6] = [
    r#"a[href*="download"]"#,
    r#"a[href*="original"]"#,
    r#"a[href*="full"]"#,
    r#"a[href*="large"]"#,
    ".download-link",
    ".full-size-link",
];

/// Social-preview metadata tags, in priority order.
const META_SELECTORS: [&str; 3] = [
    r#"meta[property="og:image"]"#,
    r#"meta[name="twitter:image"]"#,
    r#"meta[property="og:image:url"]"#,
];

/// Service resolving photo detail pages to full-size image URLs.
pub struct ImageResolver {
    client: reqwest::Client,
    classifier: ServiceClassifier,
    page_timeout: Duration,
    image_extensions: Vec<String>,
}

impl ImageResolver {
    pub fn new(
        client: reqwest::Client,
        classifier: ServiceClassifier,
        crawler: &CrawlerConfig,
        filters: &FilterConfig,
    ) -> Self {
        Self {
            client,
            classifier,
            page_timeout: Duration::from_secs(crawler.page_timeout_secs),
            image_extensions: filters.image_extensions.clone(),
        }
    }

    /// Resolve a detail page to its best image URL.
    ///
    /// Returns `None` when the page cannot be fetched, is not an urban
    /// service page, or no strategy finds an image. All failures are
    /// absorbed here; nothing propagates to the caller.
    pub async fn resolve(&self, page_url: &str) -> Option<ResolvedImage> {
        log::debug!("Resolving photo page: {page_url}");

        let document = match fetch_page(&self.client, page_url, self.page_timeout).await {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Failed to fetch photo page {page_url}: {e}");
                return None;
            }
        };

        let Some(label) = self.classifier.classify(&document) else {
            log::debug!("Not an urban service page, skipping: {page_url}");
            return None;
        };

        let base = match Url::parse(page_url) {
            Ok(base) => base,
            Err(e) => {
                log::warn!("Unparseable photo page URL {page_url}: {e}");
                return None;
            }
        };

        let media_url = find_embedded_image(&document, &base, &self.image_extensions)
            .or_else(|| find_main_image(&document, &base))
            .or_else(|| find_download_link(&document, &base, &self.image_extensions))
            .or_else(|| find_meta_image(&document, &base))?;

        Some(ResolvedImage { media_url, label })
    }
}

/// Strategy 1: lightbox/gallery attributes and script-embedded URLs.
pub fn find_embedded_image(document: &Html, base: &Url, extensions: &[String]) -> Option<String> {
    for selector in LIGHTBOX_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        let Some(img) = document.select(&sel).next() else {
            continue;
        };
        let anchor = img
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "a");
        if let Some(href) = anchor.and_then(|a| a.value().attr("href")) {
            if has_image_extension(href, extensions) {
                return Some(resolve_url(base, href));
            }
        }
    }

    // Galleries frequently stash the full-size URL in inline scripts.
    let script_sel = Selector::parse("script").ok()?;
    let url_patterns = [
        Regex::new(r#"(?i)["']([^"']*\.(?:jpg|jpeg|png|webp)[^"']*)["']"#),
        Regex::new(r#"(?i)image["']?\s*:\s*["']([^"']*)["']"#),
        Regex::new(r#"(?i)src["']?\s*:\s*["']([^"']*)["']"#),
    ];

    for script in document.select(&script_sel) {
        let text: String = script.text().collect();
        for pattern in url_patterns.iter().flatten() {
            for caps in pattern.captures_iter(&text) {
                let Some(candidate) = caps.get(1) else { continue };
                let lower = candidate.as_str().to_lowercase();
                if SIZE_HINTS.iter().any(|hint| lower.contains(hint)) {
                    return Some(resolve_url(base, candidate.as_str()));
                }
            }
        }
    }

    None
}

/// Strategy 2: designated main-image containers, then the image with the
/// largest declared area.
pub fn find_main_image(document: &Html, base: &Url) -> Option<String> {
    for selector in MAIN_IMAGE_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(img) = document.select(&sel).next() {
            let src = img
                .value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
                .filter(|s| !s.is_empty());
            if let Some(src) = src {
                return Some(resolve_url(base, src));
            }
        }
    }

    // No designated container: pick the largest image by declared
    // width x height. Images without usable dimensions are skipped.
    let img_sel = Selector::parse("img").ok()?;
    let mut best: Option<&str> = None;
    let mut best_area: u64 = 0;

    for img in document.select(&img_sel) {
        let Some(src) = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .filter(|s| !s.is_empty())
        else {
            continue;
        };
        let (Some(w), Some(h)) = (img.value().attr("width"), img.value().attr("height")) else {
            continue;
        };
        let (Ok(w), Ok(h)) = (w.parse::<u64>(), h.parse::<u64>()) else {
            continue;
        };
        let area = w * h;
        if area > best_area {
            best_area = area;
            best = Some(src);
        }
    }

    best.map(|src| resolve_url(base, src))
}

/// Strategy 3: anchors that advertise a full-size download and point at an
/// image file.
pub fn find_download_link(document: &Html, base: &Url, extensions: &[String]) -> Option<String> {
    for selector in DOWNLOAD_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(link) = document.select(&sel).next() {
            if let Some(href) = link.value().attr("href") {
                if has_image_extension(href, extensions) {
                    return Some(resolve_url(base, href));
                }
            }
        }
    }
    None
}

/// Strategy 4: social-preview metadata.
pub fn find_meta_image(document: &Html, base: &Url) -> Option<String> {
    for selector in META_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(meta) = document.select(&sel).next() {
            if let Some(content) = meta.value().attr("content").filter(|c| !c.is_empty()) {
                return Some(resolve_url(base, content));
            }
        }
    }
    None
}
