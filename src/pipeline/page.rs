// src/pipeline/page.rs

//! Per-page resolve-then-download coordination.
//!
//! Each gallery page runs two sequential phases over a bounded worker pool:
//! Phase A resolves every candidate link concurrently, Phase B downloads the
//! surviving images concurrently. Draining the phase stream is the barrier:
//! no download starts until every resolution has finished.

use futures::stream::{self, StreamExt};

use crate::models::{CandidateLink, DownloadStatus, IndexedImage, ResolvedImage};
use crate::services::{ImageDownloader, ImageResolver};

/// Width of each page's sequence-index range.
///
/// A page yielding more than this many resolved images overlaps the next
/// page's range; the numbering scheme accepts that collision.
pub const PAGE_INDEX_STRIDE: u32 = 100;

/// Coordinator for one page's resolve and download phases.
pub struct PageProcessor<'a> {
    resolver: &'a ImageResolver,
    downloader: &'a ImageDownloader,
    workers: usize,
}

impl<'a> PageProcessor<'a> {
    pub fn new(
        resolver: &'a ImageResolver,
        downloader: &'a ImageDownloader,
        workers: usize,
    ) -> Self {
        Self {
            resolver,
            downloader,
            workers: workers.max(1),
        }
    }

    /// Run both phases for one page; returns the filenames downloaded.
    pub async fn process(&self, page_number: u32, candidates: Vec<CandidateLink>) -> Vec<String> {
        // Phase A: resolve every candidate, writing each result into the
        // slot matching its original position. Completion order does not
        // matter; the slot vector restores candidate order.
        let mut slots: Vec<Option<ResolvedImage>> = vec![None; candidates.len()];

        let resolver = self.resolver;
        let mut resolutions = stream::iter(candidates)
            .map(|candidate| async move {
                log::debug!(
                    "Resolving candidate {} from {}",
                    candidate.position,
                    candidate.origin_page
                );
                let resolved = resolver.resolve(&candidate.url).await;
                (candidate.position, resolved)
            })
            .buffer_unordered(self.workers);

        while let Some((position, resolved)) = resolutions.next().await {
            if let Some(slot) = slots.get_mut(position) {
                *slot = resolved;
            }
        }

        let indexed = compact(slots, page_number);

        // Phase B: download the compacted, indexed images.
        let downloader = self.downloader;
        let outcomes: Vec<_> = stream::iter(indexed)
            .map(|image| async move { downloader.download(&image).await })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        outcomes
            .into_iter()
            .filter(|outcome| outcome.status == DownloadStatus::Downloaded)
            .map(|outcome| outcome.filename)
            .collect()
    }
}

/// Drop unresolved slots and assign page-offset sequence indices.
///
/// The result is a subsequence of the input in position order, with indices
/// `(page_number - 1) * PAGE_INDEX_STRIDE + rank`, rank starting at 1.
fn compact(slots: Vec<Option<ResolvedImage>>, page_number: u32) -> Vec<IndexedImage> {
    let base = page_number.saturating_sub(1) * PAGE_INDEX_STRIDE;

    slots
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(rank, image)| IndexedImage {
            sequence_index: base + rank as u32 + 1,
            image,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceLabel;

    fn resolved(n: u32) -> ResolvedImage {
        ResolvedImage {
            media_url: format!("https://cdn.example.com/img/{n}.jpg"),
            label: ServiceLabel {
                line_id: format!("{n}"),
                name: format!("Linha {n}"),
            },
        }
    }

    #[test]
    fn test_compact_drops_holes_and_keeps_order() {
        let slots = vec![
            Some(resolved(0)),
            None,
            Some(resolved(2)),
            None,
            Some(resolved(4)),
        ];
        let indexed = compact(slots, 1);

        let urls: Vec<_> = indexed.iter().map(|i| i.image.media_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/img/0.jpg",
                "https://cdn.example.com/img/2.jpg",
                "https://cdn.example.com/img/4.jpg",
            ]
        );
    }

    #[test]
    fn test_compact_indices_are_unique_and_increasing() {
        let slots = (0..10).map(|n| Some(resolved(n))).collect();
        let indexed = compact(slots, 1);

        for window in indexed.windows(2) {
            assert!(window[0].sequence_index < window[1].sequence_index);
        }
    }

    #[test]
    fn test_compact_page_offset_range() {
        let slots = (0..5).map(|n| Some(resolved(n))).collect();
        let indexed = compact(slots, 3);

        let indices: Vec<_> = indexed.iter().map(|i| i.sequence_index).collect();
        assert_eq!(indices, vec![201, 202, 203, 204, 205]);
        for index in indices {
            assert!((201..=300).contains(&index));
        }
    }

    #[test]
    fn test_compact_all_holes_yields_empty() {
        let slots: Vec<Option<ResolvedImage>> = vec![None; 4];
        assert!(compact(slots, 1).is_empty());
    }

    #[test]
    fn test_compact_overflow_spills_into_next_page_range() {
        // 101 resolved images on page 1: the last index lands inside page
        // 2's range. The numbering scheme accepts this collision.
        let slots = (0..101).map(|n| Some(resolved(n))).collect();
        let indexed = compact(slots, 1);

        assert_eq!(indexed.last().unwrap().sequence_index, 101);
        assert!(indexed.last().unwrap().sequence_index > PAGE_INDEX_STRIDE);
    }
}
