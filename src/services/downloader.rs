//! Image download service.
//!
//! Streams a resolved image URL to disk under the configured directory.
//! Existing files are skipped, and failures are logged and absorbed; a
//! download never aborts the page or the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{CrawlerConfig, DownloadOutcome, DownloadStatus, IndexedImage};
use crate::utils::filename::image_filename;

/// Service for downloading resolved images.
pub struct ImageDownloader {
    client: reqwest::Client,
    download_dir: PathBuf,
    image_timeout: Duration,
}

impl ImageDownloader {
    pub fn new(
        client: reqwest::Client,
        download_dir: impl Into<PathBuf>,
        crawler: &CrawlerConfig,
    ) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
            image_timeout: Duration::from_secs(crawler.image_timeout_secs),
        }
    }

    /// Download one image to its deterministic filename.
    ///
    /// The existence pre-check and the write are not atomic; two images
    /// resolving to the same filename within a page race, last writer wins.
    pub async fn download(&self, indexed: &IndexedImage) -> DownloadOutcome {
        let filename = image_filename(
            indexed.sequence_index,
            Some(&indexed.image.label),
            &indexed.image.media_url,
        );
        let path = self.download_dir.join(&filename);

        if path.exists() {
            log::info!("Already exists, skipping: {filename}");
            return DownloadOutcome {
                filename,
                status: DownloadStatus::Skipped,
            };
        }

        log::info!(
            "Downloading {} (line {} - {})",
            filename,
            indexed.image.label.line_id,
            indexed.image.label.name
        );

        match self.fetch_to_file(&indexed.image.media_url, &path).await {
            Ok(()) => {
                log::info!("Downloaded: {filename}");
                DownloadOutcome {
                    filename,
                    status: DownloadStatus::Downloaded,
                }
            }
            Err(e) => {
                log::warn!("Failed to download {}: {e}", indexed.image.media_url);
                DownloadOutcome {
                    filename,
                    status: DownloadStatus::Failed,
                }
            }
        }
    }

    /// Stream the response body to the target path in chunks.
    async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .timeout(self.image_timeout)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(path).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }
}
