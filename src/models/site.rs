//! Site identity.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::OriginStrategy;

/// Advisory classification of a site, re-evaluated on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SiteType {
    Structured,
    Feed,
    Heuristic,
    #[default]
    Unknown,
}

impl From<OriginStrategy> for SiteType {
    fn from(origin: OriginStrategy) -> Self {
        match origin {
            OriginStrategy::StructuredApi => Self::Structured,
            OriginStrategy::Feed => Self::Feed,
            OriginStrategy::HeuristicHtml => Self::Heuristic,
        }
    }
}

/// A news site to scrape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    /// Host without a leading `www.` (e.g. "lefaso.net")
    pub id: String,

    /// Display name (e.g. "Lefaso")
    pub name: String,

    /// Normalized base URL without trailing slash
    pub base_url: String,

    #[serde(default)]
    pub detected_type: SiteType,
}

impl Site {
    /// Build a site from a user-supplied URL.
    pub fn from_url(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "unsupported scheme in site URL: {trimmed}"
            )));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| AppError::validation(format!("site URL has no host: {trimmed}")))?
            .to_lowercase();
        let id = host.strip_prefix("www.").unwrap_or(&host).to_string();

        Ok(Self {
            name: crate::utils::site_name(&id),
            id,
            base_url: trimmed.to_string(),
            detected_type: SiteType::Unknown,
        })
    }

    /// Join a path onto the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_normalizes() {
        let site = Site::from_url(" https://www.Lefaso.net/ ").unwrap();
        assert_eq!(site.id, "lefaso.net");
        assert_eq!(site.name, "Lefaso");
        assert_eq!(site.base_url, "https://www.Lefaso.net");
        assert_eq!(site.detected_type, SiteType::Unknown);
    }

    #[test]
    fn test_from_url_rejects_non_http() {
        assert!(Site::from_url("ftp://x.test").is_err());
        assert!(Site::from_url("not a url").is_err());
    }

    #[test]
    fn test_url_for() {
        let site = Site::from_url("https://x.test").unwrap();
        assert_eq!(site.url_for("/wp-json/"), "https://x.test/wp-json/");
        assert_eq!(site.url_for("feed"), "https://x.test/feed");
    }
}
