// src/utils/http.rs

//! HTTP fetching.
//!
//! Every strategy receives a [`Fetcher`] value instead of building its own
//! client, so tests can substitute canned responses.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// A successful (2xx) response.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl FetchResponse {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Lowercased content type, empty when absent.
    pub fn content_type(&self) -> String {
        self.header("content-type").unwrap_or_default().to_lowercase()
    }
}

/// Performs a single GET. Implementations must not retry: a failure is
/// reported once and the caller decides whether to skip or fall back.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, returning the body for 2xx answers and
    /// `Timeout`, `Connection` or `HttpStatus` errors otherwise.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

/// reqwest-backed fetcher with a fixed user agent, timeout and redirect policy.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a configured fetcher.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn classify(url: &str, error: reqwest::Error) -> AppError {
        if error.is_timeout() {
            AppError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = error.status() {
            AppError::http_status(url, status.as_u16())
        } else {
            AppError::connection(url, error)
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("GET {} -> {}", url, status);
            return Err(AppError::http_status(url, status.as_u16()));
        }

        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(url, e))?;

        log::debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(FetchResponse {
            url: final_url,
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert(
            "content-type".to_string(),
            "Application/RSS+XML; charset=UTF-8".to_string(),
        );
        let response = FetchResponse {
            headers,
            ..FetchResponse::default()
        };
        assert!(response.header("Content-Type").is_some());
        assert_eq!(response.content_type(), "application/rss+xml; charset=utf-8");
    }

    #[test]
    fn test_create_fetcher() {
        assert!(HttpFetcher::new(&CrawlerConfig::default()).is_ok());
    }
}
