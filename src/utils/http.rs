// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use scraper::Html;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Create the pooled asynchronous HTTP client used for the whole run.
pub fn create_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle)
        .timeout(Duration::from_secs(config.page_timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page with a custom timeout and parse it as HTML.
pub async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Html> {
    let text = client
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(Html::parse_document(&text))
}
