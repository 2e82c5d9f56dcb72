// src/services/heuristic.rs

//! Heuristic HTML strategy.
//!
//! Works on any site: links on the homepage are classified as article
//! candidates, then each candidate page is fetched and run through the
//! field extractor.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Article, Config, OriginStrategy, Site};
use crate::services::classifier::ArticleUrlClassifier;
use crate::services::extractor::FieldExtractor;
use crate::services::strategy::{ArticleDraft, ScrapeContext, Strategy, StrategyResult, pause};
use crate::utils::http::Fetcher;
use crate::utils::resolve_url;

/// Scrapes article pages linked from the homepage.
pub struct HeuristicHtmlStrategy {
    fetcher: Arc<dyn Fetcher>,
    classifier: ArticleUrlClassifier,
    extractor: FieldExtractor,
    delay: Duration,
    min_body_chars: usize,
    excerpt_chars: usize,
}

impl HeuristicHtmlStrategy {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            classifier: ArticleUrlClassifier::new(),
            extractor: FieldExtractor::new(&config.scrape),
            delay: config.crawler.request_delay(),
            min_body_chars: config.scrape.min_body_chars,
            excerpt_chars: config.scrape.excerpt_chars,
        }
    }

    /// Article candidates linked from `html`, deduplicated in document
    /// order and capped at `max`.
    pub fn candidate_links(&self, html: &str, page_url: &str, site: &Site, max: usize) -> Vec<String> {
        let Ok(base) = Url::parse(page_url) else {
            return Vec::new();
        };
        let Ok(anchor) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        let document = Html::parse_document(html);

        let mut seen = HashSet::new();
        document
            .select(&anchor)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_url(&base, href))
            .filter(|url| self.classifier.is_article(url, &site.base_url))
            .filter(|url| seen.insert(url.clone()))
            .take(max)
            .collect()
    }

    /// Fetch and extract one candidate. `Ok(None)` means the article is
    /// outside the date window.
    async fn scrape_candidate(
        &self,
        site: &Site,
        url: &str,
        ctx: &ScrapeContext,
    ) -> Result<Option<Article>> {
        let page = self.fetcher.fetch(url).await?;
        let fields = self.extractor.extract(&page.body, url)?;
        if fields.published_at.is_some_and(|d| !ctx.window.contains(&d)) {
            return Ok(None);
        }

        let draft = ArticleDraft {
            url: url.to_string(),
            title: fields.title,
            body: fields.body,
            author: fields.author,
            published_at: fields.published_at,
            image_url: fields.image_url,
            ..ArticleDraft::default()
        };
        draft
            .into_article(site, self.origin(), self.excerpt_chars, self.min_body_chars)
            .map(Some)
    }
}

#[async_trait]
impl Strategy for HeuristicHtmlStrategy {
    fn origin(&self) -> OriginStrategy {
        OriginStrategy::HeuristicHtml
    }

    async fn attempt(&self, site: &Site, ctx: &ScrapeContext) -> Result<StrategyResult> {
        let homepage = self.fetcher.fetch(&site.base_url).await?;
        let candidates = self.candidate_links(&homepage.body, &homepage.url, site, ctx.max_articles);
        if candidates.is_empty() {
            return Err(AppError::NoCandidates(format!(
                "no article links on {}",
                site.base_url
            )));
        }
        log::info!("[{}] {} candidate article links", site.id, candidates.len());

        let mut result = StrategyResult::default();
        for (i, url) in candidates.iter().enumerate() {
            if ctx.deadline_reached() {
                result.interrupted = true;
                break;
            }
            if i > 0 {
                pause(self.delay).await;
            }

            match self.scrape_candidate(site, url, ctx).await {
                Ok(Some(article)) => result.articles.push(article),
                Ok(None) => result.out_of_window += 1,
                Err(e) => {
                    log::debug!("[{}] Skipping {}: {}", site.id, url, e);
                    result.skipped += 1;
                }
            }
        }

        Ok(result)
    }
}
