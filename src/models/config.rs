//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and politeness settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Recency window, limits and extraction thresholds
    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent_sites == 0 {
            return Err(AppError::validation(
                "crawler.max_concurrent_sites must be > 0",
            ));
        }
        if self.scrape.days_window == 0 {
            return Err(AppError::validation("scrape.days_window must be > 0"));
        }
        if self.scrape.max_articles_per_site == 0 {
            return Err(AppError::validation(
                "scrape.max_articles_per_site must be > 0",
            ));
        }
        if self.scrape.api_page_size == 0 || self.scrape.api_page_size > 100 {
            return Err(AppError::validation(
                "scrape.api_page_size must be between 1 and 100",
            ));
        }
        if self.scrape.api_max_pages == 0 {
            return Err(AppError::validation("scrape.api_max_pages must be > 0"));
        }
        if self.scrape.min_title_chars == 0 {
            return Err(AppError::validation("scrape.min_title_chars must be > 0"));
        }
        if self.scrape.max_body_chars < self.scrape.min_body_chars {
            return Err(AppError::validation(
                "scrape.max_body_chars must be >= scrape.min_body_chars",
            ));
        }
        if self.scrape.feed_paths.is_empty() {
            return Err(AppError::validation("No feed paths defined"));
        }
        Ok(())
    }
}

/// HTTP client and politeness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between candidate fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Redirect hops followed before giving up
    #[serde(default = "defaults::max_redirects")]
    pub max_redirects: usize,

    /// Sites scraped in parallel during a batch run
    #[serde(default = "defaults::max_concurrent_sites")]
    pub max_concurrent_sites: usize,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_redirects: defaults::max_redirects(),
            max_concurrent_sites: defaults::max_concurrent_sites(),
        }
    }
}

/// Scrape window, limits and extraction thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Only articles from the last N days are kept
    #[serde(default = "defaults::days_window")]
    pub days_window: u32,

    #[serde(default = "defaults::max_articles_per_site")]
    pub max_articles_per_site: usize,

    /// Optional run-scoped deadline per site, in seconds
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    /// Posts requested per structured API page
    #[serde(default = "defaults::api_page_size")]
    pub api_page_size: usize,

    /// Hard ceiling on structured API pages
    #[serde(default = "defaults::api_max_pages")]
    pub api_max_pages: usize,

    /// Conventional feed locations, probed in order
    #[serde(default = "defaults::feed_paths")]
    pub feed_paths: Vec<String>,

    #[serde(default = "defaults::min_title_chars")]
    pub min_title_chars: usize,

    #[serde(default = "defaults::min_body_chars")]
    pub min_body_chars: usize,

    #[serde(default = "defaults::max_body_chars")]
    pub max_body_chars: usize,

    #[serde(default = "defaults::excerpt_chars")]
    pub excerpt_chars: usize,
}

impl ScrapeConfig {
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            days_window: defaults::days_window(),
            max_articles_per_site: defaults::max_articles_per_site(),
            run_timeout_secs: None,
            api_page_size: defaults::api_page_size(),
            api_max_pages: defaults::api_max_pages(),
            feed_paths: defaults::feed_paths(),
            min_title_chars: defaults::min_title_chars(),
            min_body_chars: defaults::min_body_chars(),
            max_body_chars: defaults::max_body_chars(),
            excerpt_chars: defaults::excerpt_chars(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::storage_dir")]
    pub storage_dir: String,

    #[serde(default = "defaults::sites_file")]
    pub sites_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            storage_dir: defaults::storage_dir(),
            sites_file: defaults::sites_file(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; mediascan/0.1; +https://github.com/mediascan)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        500
    }
    pub fn max_redirects() -> usize {
        10
    }
    pub fn max_concurrent_sites() -> usize {
        1
    }

    // Scrape defaults
    pub fn days_window() -> u32 {
        30
    }
    pub fn max_articles_per_site() -> usize {
        100
    }
    pub fn api_page_size() -> usize {
        100
    }
    pub fn api_max_pages() -> usize {
        5
    }
    pub fn feed_paths() -> Vec<String> {
        [
            "/feed/",
            "/feed",
            "/rss/",
            "/rss",
            "/atom.xml",
            "/rss.xml",
            "/feed.xml",
            "/index.rss",
            "/spip.php?page=backend",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn min_title_chars() -> usize {
        10
    }
    pub fn min_body_chars() -> usize {
        100
    }
    pub fn max_body_chars() -> usize {
        5000
    }
    pub fn excerpt_chars() -> usize {
        300
    }

    // Logging / paths
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn storage_dir() -> String {
        "storage".into()
    }
    pub fn sites_file() -> String {
        "sites.txt".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_api_page() {
        let mut config = Config::default();
        config.scrape.api_page_size = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_title_minimum() {
        let mut config = Config::default();
        config.scrape.min_title_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scrape]
            days_window = 7

            [crawler]
            request_delay_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.scrape.days_window, 7);
        assert_eq!(config.scrape.max_articles_per_site, 100);
        assert_eq!(config.crawler.request_delay_ms, 0);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.scrape.feed_paths.first().map(String::as_str), Some("/feed/"));
    }
}
