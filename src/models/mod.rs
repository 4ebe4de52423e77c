// src/models/mod.rs

//! Domain models for the crawler application.

mod candidate;
mod config;
mod image;
mod stats;

// Re-export all public types
pub use candidate::CandidateLink;
pub use config::{Config, CrawlerConfig, FilterConfig, OutputConfig};
pub use image::{
    DownloadOutcome, DownloadStatus, FALLBACK_NAME, IndexedImage, ResolvedImage, ServiceLabel,
    UNKNOWN_LINE,
};
pub use stats::CrawlStats;
