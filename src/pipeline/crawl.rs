// src/pipeline/crawl.rs

//! Breadth-first crawl over a paginated photo gallery.
//!
//! Drives the page-level loop: dequeue a gallery page, extract candidate
//! photo links, hand them to the two-phase page processor, then discover
//! pagination links and enqueue them. One page at a time; all of a page's
//! work finishes before the next page starts.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{Config, CrawlStats};
use crate::pipeline::page::PageProcessor;
use crate::services::{ImageDownloader, ImageResolver, LinkExtractor, ServiceClassifier};
use crate::utils::http;
use crate::utils::resolve_url;

/// Structural and URL-pattern heuristics for pagination links.
const PAGINATION_SELECTORS: [&str; 6] = [
    r#"a[href*="page"]"#,
    r#"a[href*="pagina"]"#,
    ".pagination a",
    ".pager a",
    r#"a[href*="offset"]"#,
    r#"a[href*="start"]"#,
];

/// Run the crawl from a start URL.
///
/// `max_pages` bounds the number of gallery pages processed (None =
/// unbounded); `workers_override` replaces the configured worker count,
/// subject to the run-wide clamp.
pub async fn run_crawl(
    config: &Config,
    start_url: &str,
    max_pages: Option<usize>,
    workers_override: Option<usize>,
) -> Result<CrawlStats> {
    let workers = config.crawler.effective_workers(workers_override);
    log::info!("Starting crawl at {start_url} with {workers} workers");

    let download_dir = Path::new(&config.output.download_dir);
    tokio::fs::create_dir_all(download_dir).await?;

    let client = http::create_client(&config.crawler)?;
    let extractor = LinkExtractor::from_config(&config.filters);
    let resolver = ImageResolver::new(
        client.clone(),
        ServiceClassifier::new(),
        &config.crawler,
        &config.filters,
    );
    let downloader = ImageDownloader::new(client.clone(), download_dir, &config.crawler);
    let processor = PageProcessor::new(&resolver, &downloader, workers);

    let page_timeout = Duration::from_secs(config.crawler.page_timeout_secs);
    let mut stats = CrawlStats::start();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::from([start_url.to_string()]);

    loop {
        if let Some(limit) = max_pages {
            if stats.pages_processed >= limit {
                break;
            }
        }
        let Some(current_url) = queue.pop_front() else {
            break;
        };
        if !visited.insert(current_url.clone()) {
            continue;
        }

        stats.pages_processed += 1;
        let page_number = stats.pages_processed as u32;
        log::info!("Processing page {page_number}: {current_url}");

        // The parsed page is dropped before the resolve/download phases;
        // only the extracted candidates cross into them.
        let candidates = match http::fetch_page(&client, &current_url, page_timeout).await {
            Ok(document) => match Url::parse(&current_url) {
                Ok(page_url) => Some(extractor.extract(&document, &page_url)),
                Err(e) => {
                    log::warn!("Unparseable page URL {current_url}: {e}");
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to fetch page {current_url}: {e}");
                None
            }
        };

        if let Some(candidates) = candidates {
            log::info!(
                "Found {} candidate photo links on page {page_number}",
                candidates.len()
            );
            stats.images_found += candidates.len();

            let downloaded = processor.process(page_number, candidates).await;
            log::info!(
                "Page {page_number} complete: {} photos downloaded",
                downloaded.len()
            );
        }

        // Look for further gallery pages unless the limit is already met.
        let more_allowed = max_pages.is_none_or(|limit| stats.pages_processed < limit);
        if more_allowed {
            match http::fetch_page(&client, &current_url, page_timeout).await {
                Ok(document) => {
                    if let Ok(page_url) = Url::parse(&current_url) {
                        for url in discover_pagination(&document, &page_url) {
                            if !visited.contains(&url) && !queue.contains(&url) {
                                log::info!("Discovered new page: {url}");
                                queue.push_back(url);
                            }
                        }
                    }
                }
                Err(e) => log::debug!("Pagination fetch failed for {current_url}: {e}"),
            }
        }
    }

    stats.finished_at = Utc::now();
    log::info!("Crawl complete!");
    log::info!("Pages processed: {}", stats.pages_processed);
    log::info!("Photo links found: {}", stats.images_found);
    log::info!("Images saved to: {}", download_dir.display());

    Ok(stats)
}

/// Extract candidate pagination URLs from a gallery page, deduplicated and
/// excluding the page itself.
fn discover_pagination(document: &Html, current_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for selector in PAGINATION_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        for link in document.select(&sel) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let full_url = resolve_url(current_url, href);
            if full_url != current_url.as_str() && seen.insert(full_url.clone()) {
                urls.push(full_url);
            }
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discover(body: &str, current: &str) -> Vec<String> {
        let document = Html::parse_document(&format!("<html><body>{body}</body></html>"));
        let current_url = Url::parse(current).unwrap();
        discover_pagination(&document, &current_url)
    }

    #[test]
    fn test_discovers_pagination_links() {
        let urls = discover(
            r#"<div class="pagination">
                 <a href="/gallery?pagina=2">2</a>
                 <a href="/gallery?pagina=3">3</a>
               </div>"#,
            "https://example.com/gallery?pagina=1",
        );
        assert_eq!(
            urls,
            vec![
                "https://example.com/gallery?pagina=2",
                "https://example.com/gallery?pagina=3",
            ]
        );
    }

    #[test]
    fn test_excludes_current_url() {
        let urls = discover(
            r#"<a href="/gallery?pagina=1">1</a><a href="/gallery?pagina=2">2</a>"#,
            "https://example.com/gallery?pagina=1",
        );
        assert_eq!(urls, vec!["https://example.com/gallery?pagina=2"]);
    }

    #[test]
    fn test_deduplicates_across_selectors() {
        // The same link matches both a URL-pattern and a structural
        // selector; it must be enqueued once.
        let urls = discover(
            r#"<div class="pager"><a href="/gallery?pagina=2">next</a></div>"#,
            "https://example.com/gallery",
        );
        assert_eq!(urls, vec!["https://example.com/gallery?pagina=2"]);
    }

    #[test]
    fn test_ignores_links_without_href() {
        let urls = discover(
            r#"<div class="pagination"><a>2</a></div>"#,
            "https://example.com/gallery",
        );
        assert!(urls.is_empty());
    }
}
