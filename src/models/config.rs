//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Hard ceiling for the worker pool, regardless of configuration.
pub const MAX_WORKERS: usize = 16;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Candidate link filtering rules
    #[serde(default)]
    pub filters: FilterConfig,

    /// Output location settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        if !path.as_ref().exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.page_timeout_secs == 0 {
            return Err(AppError::validation("crawler.page_timeout_secs must be > 0"));
        }
        if self.crawler.image_timeout_secs == 0 {
            return Err(AppError::validation(
                "crawler.image_timeout_secs must be > 0",
            ));
        }
        if self.crawler.max_workers == 0 {
            return Err(AppError::validation("crawler.max_workers must be > 0"));
        }
        if self.filters.min_dimension == 0 {
            return Err(AppError::validation("filters.min_dimension must be > 0"));
        }
        if self.output.download_dir.trim().is_empty() {
            return Err(AppError::validation("output.download_dir is empty"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Timeout for gallery/detail page fetches, in seconds
    #[serde(default = "defaults::page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for image body transfers, in seconds
    #[serde(default = "defaults::image_timeout")]
    pub image_timeout_secs: u64,

    /// Worker pool size for the per-page resolve and download phases
    #[serde(default = "defaults::max_workers")]
    pub max_workers: usize,

    /// Idle connections kept per host in the client pool
    #[serde(default = "defaults::pool_max_idle")]
    pub pool_max_idle: usize,
}

impl CrawlerConfig {
    /// Effective worker count: an optional override wins over the configured
    /// value; the result is clamped to `1..=MAX_WORKERS`.
    pub fn effective_workers(&self, cli_override: Option<usize>) -> usize {
        cli_override
            .unwrap_or(self.max_workers)
            .clamp(1, MAX_WORKERS)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            page_timeout_secs: defaults::page_timeout(),
            image_timeout_secs: defaults::image_timeout(),
            max_workers: defaults::max_workers(),
            pool_max_idle: defaults::pool_max_idle(),
        }
    }
}

/// Candidate link filtering rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum declared width/height for a thumbnail to qualify
    #[serde(default = "defaults::min_dimension")]
    pub min_dimension: u32,

    /// URL substrings that mark chrome assets (icons, logos, ...)
    #[serde(default = "defaults::exclude_keywords")]
    pub exclude_keywords: Vec<String>,

    /// Query fragments that mark pagination links
    #[serde(default = "defaults::pagination_markers")]
    pub pagination_markers: Vec<String>,

    /// Recognized image file extensions
    #[serde(default = "defaults::image_extensions")]
    pub image_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_dimension: defaults::min_dimension(),
            exclude_keywords: defaults::exclude_keywords(),
            pagination_markers: defaults::pagination_markers(),
            image_extensions: defaults::image_extensions(),
        }
    }
}

/// Output location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory downloaded images are written to
    #[serde(default = "defaults::download_dir")]
    pub download_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: defaults::download_dir(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
            .into()
    }
    pub fn page_timeout() -> u64 {
        5
    }
    pub fn image_timeout() -> u64 {
        15
    }
    pub fn max_workers() -> usize {
        8
    }
    pub fn pool_max_idle() -> usize {
        20
    }

    // Filter defaults
    pub fn min_dimension() -> u32 {
        100
    }
    pub fn exclude_keywords() -> Vec<String> {
        vec![
            "icon".into(),
            "logo".into(),
            "favicon".into(),
            "sprite".into(),
            "menu".into(),
            "header".into(),
            "footer".into(),
        ]
    }
    pub fn pagination_markers() -> Vec<String> {
        vec![
            "page=".into(),
            "offset=".into(),
            "start=".into(),
            "pagina=".into(),
        ]
    }
    pub fn image_extensions() -> Vec<String> {
        vec![".jpg".into(), ".jpeg".into(), ".png".into(), ".webp".into()]
    }

    // Output defaults
    pub fn download_dir() -> String {
        "onibus_images".into()
    }
}
