//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper:
//! - Building HTTP clients with a polite user agent string
//! - GET requests for listing and detail pages
//! - Status validation (anything outside 2xx ends the walk)
//!
//! There is no retry: a failed listing is expected to be re-run as a whole.

use crate::config::{Config, ScraperConfig, UserAgentConfig};
use crate::ScrapeError;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent identification
/// * `scraper` - Timeouts and scheme policy
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    scraper: &ScraperConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = scraper.request_timeout();

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .https_only(scraper.https_only)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues GET requests and validates their status
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the full configuration
    pub fn from_config(config: &Config) -> Result<Self, ScrapeError> {
        Ok(Self::new(build_http_client(&config.user_agent, &config.scraper)?))
    }

    /// Fetches `url` and returns the response body
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - 2xx response body
    /// * `Err(ScrapeError::Http)` - Connection, DNS, TLS, timeout or body read failure
    /// * `Err(ScrapeError::Status)` - Any non-2xx status
    pub async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| {
                tracing::warn!("Request to {} failed: {}", url, source);
                ScrapeError::Http {
                    url: url.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("HTTP {} at {}", status.as_u16(), url);
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        tracing::info!("Success: {} at {}", status.as_u16(), url);

        response.text().await.map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })
    }
}
