//! Normalized article record produced by every strategy.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Strategy that produced an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginStrategy {
    StructuredApi,
    Feed,
    HeuristicHtml,
}

impl OriginStrategy {
    /// Priority order in which the orchestrator tries strategies.
    pub const PRIORITY: [OriginStrategy; 3] = [Self::StructuredApi, Self::Feed, Self::HeuristicHtml];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuredApi => "structured_api",
            Self::Feed => "feed",
            Self::HeuristicHtml => "heuristic_html",
        }
    }
}

impl fmt::Display for OriginStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized article.
///
/// `canonical_url` is the sole external identity: two articles with the
/// same URL are the same article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Identifier of the site the article was collected from
    pub source_site_id: String,

    /// Article headline
    pub title: String,

    /// Plain-text body
    pub body: String,

    /// Short summary (feed/API excerpt or leading body text)
    #[serde(default)]
    pub excerpt: String,

    /// Absolute article URL
    pub canonical_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub origin_strategy: OriginStrategy,

    pub fetched_at: DateTime<Utc>,
}

impl Article {
    /// Check the acceptance rules: non-empty title, non-empty URL and a
    /// body of at least `min_body_chars` characters.
    pub fn validate(&self, min_body_chars: usize) -> Result<()> {
        if self.canonical_url.trim().is_empty() {
            return Err(AppError::insufficient("<missing>", "article URL is empty"));
        }
        if self.title.trim().is_empty() {
            return Err(AppError::insufficient(&self.canonical_url, "title is empty"));
        }
        let body_len = self.body.chars().count();
        if body_len < min_body_chars {
            return Err(AppError::insufficient(
                &self.canonical_url,
                format!("body has {body_len} chars, need {min_body_chars}"),
            ));
        }
        Ok(())
    }
}

/// Where an extracted publish date came from, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// `article:published_time`, `og:published_time`, `itemprop=datePublished`, ...
    Metadata,
    /// `<time datetime="...">`
    TimeElement,
    /// Text inside a date-classed container
    VisibleText,
    /// `/YYYY/MM[/DD]/` in the URL path
    UrlPath,
}

/// Fields extracted from a single HTML page.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleFields {
    pub title: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
    pub date_source: Option<DateSource>,
    pub author: Option<String>,
    pub image_url: Option<String>,
}
