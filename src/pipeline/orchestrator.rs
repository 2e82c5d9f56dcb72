// src/pipeline/orchestrator.rs

//! Per-site strategy fallback.
//!
//! Strategies run in priority order; the first one that produces at least
//! one article wins and the rest are never tried. Every run records exactly
//! one [`ScrapeOutcome`].

use std::sync::Arc;

use chrono::Utc;

use crate::error::FailureKind;
use crate::models::{
    Article, Config, DateWindow, OriginStrategy, ScrapeConfig, ScrapeOutcome, ScrapeStatus, Site,
    SiteType,
};
use crate::services::{
    FeedStrategy, HeuristicHtmlStrategy, ScrapeContext, Strategy, StrategyResult,
    StructuredApiStrategy,
};
use crate::storage::{ArticleStore, InsertOutcome, ScrapeLogSink};
use crate::utils::http::Fetcher;

/// What one site run produced.
#[derive(Debug, Clone)]
pub struct SiteReport {
    /// Requested URL, as given by the caller
    pub url: String,
    /// Site id, or the raw URL when it could not be parsed
    pub site_id: String,
    /// Articles newly saved
    pub article_count: usize,
    pub strategy_used: Option<OriginStrategy>,
    /// Classification implied by the winning strategy
    pub site_type: SiteType,
    pub status: ScrapeStatus,
    pub message: String,
    /// Articles the winning strategy produced, saved or not
    pub articles: Vec<Article>,
}

/// Runs the strategy chain for one site at a time.
pub struct ScraperOrchestrator {
    strategies: Vec<Box<dyn Strategy>>,
    store: Arc<dyn ArticleStore>,
    log_sink: Arc<dyn ScrapeLogSink>,
    config: ScrapeConfig,
}

impl ScraperOrchestrator {
    /// Orchestrator with the standard chain: structured API, feed, heuristic HTML.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        config: &Config,
        store: Arc<dyn ArticleStore>,
        log_sink: Arc<dyn ScrapeLogSink>,
    ) -> Self {
        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(StructuredApiStrategy::new(Arc::clone(&fetcher), config)),
            Box::new(FeedStrategy::new(Arc::clone(&fetcher), config)),
            Box::new(HeuristicHtmlStrategy::new(fetcher, config)),
        ];
        Self::with_strategies(strategies, config.scrape.clone(), store, log_sink)
    }

    /// Orchestrator with a custom strategy chain, tried in the given order.
    pub fn with_strategies(
        strategies: Vec<Box<dyn Strategy>>,
        config: ScrapeConfig,
        store: Arc<dyn ArticleStore>,
        log_sink: Arc<dyn ScrapeLogSink>,
    ) -> Self {
        Self {
            strategies,
            store,
            log_sink,
            config,
        }
    }

    /// Scrape one site for articles published in the last `days` days.
    ///
    /// Never fails: every problem ends up in the report's status and
    /// message, and in the recorded outcome.
    pub async fn scrape_site(&self, site_url: &str, days: u32) -> SiteReport {
        let mut site = match Site::from_url(site_url) {
            Ok(site) => site,
            Err(e) => {
                log::error!("Invalid site URL {}: {}", site_url, e);
                let report = SiteReport {
                    url: site_url.to_string(),
                    site_id: site_url.trim().to_string(),
                    article_count: 0,
                    strategy_used: None,
                    site_type: SiteType::Unknown,
                    status: ScrapeStatus::Error,
                    message: e.to_string(),
                    articles: Vec::new(),
                };
                self.record(&report, 0).await;
                return report;
            }
        };

        let ctx = ScrapeContext::new(DateWindow::last_days(days), self.config.max_articles_per_site)
            .with_timeout(self.config.run_timeout());
        log::info!(
            "[{}] Scraping {} (articles since {})",
            site.id,
            site.base_url,
            ctx.window.cutoff.format("%Y-%m-%d %H:%M")
        );

        let mut notes = Vec::new();
        let mut winner = None;
        for strategy in &self.strategies {
            let origin = strategy.origin();
            if ctx.deadline_reached() {
                notes.push(format!("{origin}: run deadline reached"));
                break;
            }
            match strategy.attempt(&site, &ctx).await {
                Ok(result) if !result.articles.is_empty() => {
                    winner = Some((origin, result));
                    break;
                }
                Ok(result) => {
                    let note = result.note.unwrap_or_else(|| "no articles".to_string());
                    log::info!("[{}] {} yielded nothing: {}", site.id, origin, note);
                    notes.push(format!("{origin}: {note}"));
                }
                Err(e) => {
                    match e.kind() {
                        FailureKind::Blocked | FailureKind::NoCandidates => {
                            log::info!("[{}] {} not applicable: {}", site.id, origin, e)
                        }
                        _ => log::warn!("[{}] {} failed: {}", site.id, origin, e),
                    }
                    notes.push(format!("{origin}: {e}"));
                }
            }
        }

        let report = match winner {
            Some((origin, result)) => {
                site.detected_type = origin.into();
                self.save(&site, site_url, origin, result).await
            }
            None => {
                log::warn!("[{}] No strategy produced articles", site.id);
                SiteReport {
                    url: site_url.to_string(),
                    site_id: site.id.clone(),
                    article_count: 0,
                    strategy_used: None,
                    site_type: SiteType::Unknown,
                    status: ScrapeStatus::Error,
                    message: format!("No strategy produced articles ({})", notes.join("; ")),
                    articles: Vec::new(),
                }
            }
        };

        let found = report.articles.len();
        self.record(&report, found).await;
        report
    }

    /// Insert the winning strategy's articles and build the report.
    async fn save(
        &self,
        site: &Site,
        site_url: &str,
        origin: OriginStrategy,
        result: StrategyResult,
    ) -> SiteReport {
        let mut saved = 0;
        let mut duplicates = 0;
        let mut failed = 0;

        for article in &result.articles {
            match self.store.exists(&article.canonical_url).await {
                Ok(true) => {
                    duplicates += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    log::warn!("[{}] Lookup failed for {}: {}", site.id, article.canonical_url, e);
                    failed += 1;
                    continue;
                }
            }
            match self.store.insert(article).await {
                Ok(InsertOutcome::Inserted(_)) => saved += 1,
                Ok(InsertOutcome::AlreadyExists) => duplicates += 1,
                Err(e) => {
                    log::warn!("[{}] Insert failed for {}: {}", site.id, article.canonical_url, e);
                    failed += 1;
                }
            }
        }

        let status = if saved > 0 && !result.interrupted {
            ScrapeStatus::Success
        } else {
            ScrapeStatus::Partial
        };

        let mut message = format!(
            "{} new articles via {} ({} found, {} already stored",
            saved,
            origin,
            result.articles.len(),
            duplicates
        );
        if result.skipped > 0 {
            message.push_str(&format!(", {} skipped", result.skipped));
        }
        if failed > 0 {
            message.push_str(&format!(", {failed} not saved"));
        }
        message.push(')');
        if result.interrupted {
            message.push_str("; stopped at run deadline");
        }

        log::info!("[{}] {}", site.id, message);

        SiteReport {
            url: site_url.to_string(),
            site_id: site.id.clone(),
            article_count: saved,
            strategy_used: Some(origin),
            site_type: site.detected_type,
            status,
            message,
            articles: result.articles,
        }
    }

    async fn record(&self, report: &SiteReport, articles_found: usize) {
        let outcome = ScrapeOutcome {
            site_id: report.site_id.clone(),
            strategy_used: report.strategy_used,
            articles_found,
            articles_saved: report.article_count,
            status: report.status,
            message: report.message.clone(),
            recorded_at: Utc::now(),
        };
        if let Err(e) = self.log_sink.record(&outcome).await {
            log::warn!("[{}] Could not record scrape outcome: {}", report.site_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::{AppError, Result};
    use crate::storage::MemoryStorage;

    /// Strategy returning a canned result.
    struct Canned {
        origin: OriginStrategy,
        urls: Vec<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl Strategy for Canned {
        fn origin(&self) -> OriginStrategy {
            self.origin
        }

        async fn attempt(&self, site: &Site, _ctx: &ScrapeContext) -> Result<StrategyResult> {
            if self.fail {
                return Err(AppError::connection(&site.base_url, "refused"));
            }
            let articles = self
                .urls
                .iter()
                .map(|url| Article {
                    source_site_id: site.id.clone(),
                    title: "Budget vote passes after long debate".to_string(),
                    body: "body ".repeat(40),
                    excerpt: String::new(),
                    canonical_url: url.to_string(),
                    author: None,
                    published_at: Some(Utc::now()),
                    image_url: None,
                    categories: Vec::new(),
                    tags: Vec::new(),
                    origin_strategy: self.origin,
                    fetched_at: Utc::now(),
                })
                .collect();
            Ok(StrategyResult {
                articles,
                ..StrategyResult::default()
            })
        }
    }

    fn canned(origin: OriginStrategy, urls: Vec<&'static str>, fail: bool) -> Box<dyn Strategy> {
        Box::new(Canned { origin, urls, fail })
    }

    fn orchestrator(strategies: Vec<Box<dyn Strategy>>, storage: Arc<MemoryStorage>) -> ScraperOrchestrator {
        ScraperOrchestrator::with_strategies(
            strategies,
            ScrapeConfig::default(),
            storage.clone(),
            storage,
        )
    }

    #[tokio::test]
    async fn test_first_non_empty_strategy_wins() {
        let storage = Arc::new(MemoryStorage::new());
        let orch = orchestrator(
            vec![
                canned(OriginStrategy::StructuredApi, vec![], true),
                canned(OriginStrategy::Feed, vec!["https://x.test/a/", "https://x.test/b/"], false),
                canned(OriginStrategy::HeuristicHtml, vec!["https://x.test/c/"], false),
            ],
            storage.clone(),
        );

        let report = orch.scrape_site("https://x.test", 30).await;
        assert_eq!(report.strategy_used, Some(OriginStrategy::Feed));
        assert_eq!(report.article_count, 2);
        assert_eq!(report.status, ScrapeStatus::Success);
        assert_eq!(storage.articles().len(), 2);

        let outcomes = storage.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].articles_found, 2);
        assert_eq!(outcomes[0].strategy_used, Some(OriginStrategy::Feed));
    }

    #[tokio::test]
    async fn test_all_duplicates_is_partial() {
        let storage = Arc::new(MemoryStorage::new());
        let orch = orchestrator(
            vec![canned(OriginStrategy::Feed, vec!["https://x.test/a/"], false)],
            storage.clone(),
        );

        assert_eq!(orch.scrape_site("https://x.test", 30).await.status, ScrapeStatus::Success);
        let second = orch.scrape_site("https://x.test", 30).await;
        assert_eq!(second.status, ScrapeStatus::Partial);
        assert_eq!(second.article_count, 0);
        assert_eq!(storage.articles().len(), 1);
        assert_eq!(storage.outcomes().len(), 2);
    }

    #[tokio::test]
    async fn test_all_strategies_empty_is_error() {
        let storage = Arc::new(MemoryStorage::new());
        let orch = orchestrator(
            vec![
                canned(OriginStrategy::StructuredApi, vec![], false),
                canned(OriginStrategy::Feed, vec![], true),
            ],
            storage.clone(),
        );

        let report = orch.scrape_site("https://x.test", 30).await;
        assert_eq!(report.status, ScrapeStatus::Error);
        assert_eq!(report.strategy_used, None);
        assert!(report.message.contains("structured_api"));
        assert!(report.message.contains("refused"));
        assert_eq!(storage.outcomes()[0].status, ScrapeStatus::Error);
    }

    struct Unreachable;

    #[async_trait]
    impl Fetcher for Unreachable {
        async fn fetch(&self, url: &str) -> Result<crate::utils::http::FetchResponse> {
            Err(AppError::connection(url, "refused"))
        }
    }

    #[test]
    fn test_default_chain_follows_priority() {
        let storage = Arc::new(MemoryStorage::new());
        let orch = ScraperOrchestrator::new(
            Arc::new(Unreachable),
            &Config::default(),
            storage.clone(),
            storage,
        );
        let order: Vec<_> = orch.strategies.iter().map(|s| s.origin()).collect();
        assert_eq!(order, OriginStrategy::PRIORITY);
    }

    #[tokio::test]
    async fn test_invalid_url_is_recorded() {
        let storage = Arc::new(MemoryStorage::new());
        let orch = orchestrator(Vec::new(), storage.clone());

        let report = orch.scrape_site("ftp://x.test", 30).await;
        assert_eq!(report.status, ScrapeStatus::Error);
        assert_eq!(storage.outcomes().len(), 1);
    }
}
