// src/services/strategy.rs

//! The contract shared by the three scraping strategies.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Article, DateWindow, OriginStrategy, Site};
use crate::utils::text::excerpt;

/// Per-run parameters handed to every strategy.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeContext {
    pub window: DateWindow,
    pub max_articles: usize,
    /// Strategies stop issuing new requests once this passes
    pub deadline: Option<Instant>,
}

impl ScrapeContext {
    pub fn new(window: DateWindow, max_articles: usize) -> Self {
        Self {
            window,
            max_articles,
            deadline: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.deadline = timeout.map(|t| Instant::now() + t);
        self
    }

    pub fn deadline_reached(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// What a strategy produced for one site.
#[derive(Debug, Default)]
pub struct StrategyResult {
    /// Validated, in-window articles in discovery order
    pub articles: Vec<Article>,
    /// Items dropped for malformed data or insufficient content
    pub skipped: usize,
    /// Items dropped for falling outside the date window
    pub out_of_window: usize,
    /// The run deadline passed before the strategy finished
    pub interrupted: bool,
    /// Why the strategy did not apply, when it yielded nothing by choice
    pub note: Option<String>,
}

impl StrategyResult {
    /// Empty result for a strategy that does not apply to the site.
    pub fn not_applicable(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }

    /// True once `max` articles have been collected.
    pub fn is_full(&self, max: usize) -> bool {
        self.articles.len() >= max
    }
}

/// A way of collecting recent articles from a site.
///
/// `attempt` returns `Ok` with an empty result when the strategy does not
/// apply (protected API, no feed) and `Err` when the site could not be
/// reached at all. Either outcome makes the orchestrator move on.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn origin(&self) -> OriginStrategy;

    async fn attempt(&self, site: &Site, ctx: &ScrapeContext) -> Result<StrategyResult>;
}

/// Raw fields a strategy has gathered for one article.
#[derive(Debug, Clone, Default)]
pub(crate) struct ArticleDraft {
    pub url: String,
    pub title: String,
    pub body: String,
    pub summary: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl ArticleDraft {
    /// Normalize into an [`Article`]. Undated drafts are dated to the fetch
    /// time; the excerpt comes from the summary or else the body.
    pub fn into_article(
        self,
        site: &Site,
        origin: OriginStrategy,
        excerpt_chars: usize,
        min_body_chars: usize,
    ) -> Result<Article> {
        let fetched_at = Utc::now();
        let source = if self.summary.trim().is_empty() {
            &self.body
        } else {
            &self.summary
        };
        let article = Article {
            source_site_id: site.id.clone(),
            excerpt: excerpt(source, excerpt_chars),
            title: self.title.trim().to_string(),
            body: self.body,
            canonical_url: self.url,
            author: self.author.filter(|a| !a.trim().is_empty()),
            published_at: Some(self.published_at.unwrap_or(fetched_at)),
            image_url: self.image_url,
            categories: self.categories,
            tags: self.tags,
            origin_strategy: origin,
            fetched_at,
        };
        article.validate(min_body_chars)?;
        Ok(article)
    }
}

/// Sleep between consecutive requests to the same site.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        Site::from_url("https://x.test").unwrap()
    }

    #[test]
    fn test_deadline() {
        let window = DateWindow::last_days(30);
        assert!(!ScrapeContext::new(window, 10).deadline_reached());
        let expired = ScrapeContext::new(window, 10).with_timeout(Some(Duration::ZERO));
        assert!(expired.deadline_reached());
    }

    #[test]
    fn test_draft_dates_undated_article_to_fetch_time() {
        let draft = ArticleDraft {
            url: "https://x.test/story".into(),
            title: "  A long enough headline ".into(),
            body: "b".repeat(120),
            ..ArticleDraft::default()
        };
        let before = Utc::now();
        let article = draft
            .into_article(&site(), OriginStrategy::HeuristicHtml, 50, 100)
            .unwrap();
        assert_eq!(article.title, "A long enough headline");
        assert_eq!(article.source_site_id, "x.test");
        assert!(article.published_at.unwrap() >= before);
        assert_eq!(article.published_at, Some(article.fetched_at));
        assert!(article.excerpt.chars().count() <= 53);
    }

    #[test]
    fn test_draft_rejects_short_body() {
        let draft = ArticleDraft {
            url: "https://x.test/story".into(),
            title: "A long enough headline".into(),
            body: "short".into(),
            ..ArticleDraft::default()
        };
        assert!(
            draft
                .into_article(&site(), OriginStrategy::Feed, 50, 100)
                .is_err()
        );
    }
}
