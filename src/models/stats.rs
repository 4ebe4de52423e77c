//! Crawl run statistics.

use chrono::{DateTime, Utc};

/// Counters accumulated over a crawl run.
///
/// `images_found` counts raw candidate links extracted from gallery pages,
/// not images actually resolved or downloaded.
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub pages_processed: usize,
    pub images_found: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlStats {
    /// Start a new stats record at the current time.
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            pages_processed: 0,
            images_found: 0,
            started_at: now,
            finished_at: now,
        }
    }

    /// Elapsed run duration.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
