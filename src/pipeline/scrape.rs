// src/pipeline/scrape.rs

//! Batch scraping over a list of sites.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, OriginStrategy, ScrapeStatus};
use crate::pipeline::orchestrator::{ScraperOrchestrator, SiteReport};
use crate::storage::{ArticleStore, ScrapeLogSink};
use crate::utils::http::{Fetcher, HttpFetcher};

/// One line of the batch summary.
#[derive(Debug, Clone, Serialize)]
pub struct SiteSummary {
    pub url: String,
    pub site_id: String,
    pub status: ScrapeStatus,
    pub strategy_used: Option<OriginStrategy>,
    pub article_count: usize,
    pub message: String,
}

impl From<&SiteReport> for SiteSummary {
    fn from(report: &SiteReport) -> Self {
        Self {
            url: report.url.clone(),
            site_id: report.site_id.clone(),
            status: report.status,
            strategy_used: report.strategy_used,
            article_count: report.article_count,
            message: report.message.clone(),
        }
    }
}

/// Totals for a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total_sites: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    /// Newly saved articles across all sites
    pub total_articles: usize,
    /// Sites won by each strategy
    pub by_strategy: BTreeMap<String, usize>,
    pub sites: Vec<SiteSummary>,
}

impl RunSummary {
    fn add(&mut self, report: &SiteReport) {
        self.total_sites += 1;
        self.total_articles += report.article_count;
        match report.status {
            ScrapeStatus::Success => self.succeeded += 1,
            ScrapeStatus::Partial => self.partial += 1,
            ScrapeStatus::Error => self.failed += 1,
        }
        if let Some(origin) = report.strategy_used {
            *self.by_strategy.entry(origin.to_string()).or_default() += 1;
        }
        self.sites.push(SiteSummary::from(report));
    }

    /// Write the summary to the log.
    pub fn log(&self) {
        log::info!(
            "Scraped {} sites: {} succeeded, {} partial, {} failed, {} new articles",
            self.total_sites,
            self.succeeded,
            self.partial,
            self.failed,
            self.total_articles
        );
        for (strategy, count) in &self.by_strategy {
            log::info!("  {strategy}: {count} sites");
        }
        for site in self.sites.iter().filter(|s| s.status == ScrapeStatus::Error) {
            log::warn!("  {} failed: {}", site.url, site.message);
        }
    }
}

/// Scrape every site with reqwest-backed fetchers, one per site.
pub async fn run_scrape(
    config: &Config,
    sites: &[String],
    days: u32,
    store: Arc<dyn ArticleStore>,
    log_sink: Arc<dyn ScrapeLogSink>,
) -> Result<RunSummary> {
    // Surface client configuration errors before touching any site.
    HttpFetcher::new(&config.crawler)?;
    run_scrape_with(config, sites, days, store, log_sink, || {
        HttpFetcher::new(&config.crawler).map(|f| Arc::new(f) as Arc<dyn Fetcher>)
    })
    .await
}

/// Scrape every site, building a fresh fetcher for each one.
///
/// Up to `crawler.max_concurrent_sites` sites run at once; requests to a
/// single site are always sequential.
pub async fn run_scrape_with<F>(
    config: &Config,
    sites: &[String],
    days: u32,
    store: Arc<dyn ArticleStore>,
    log_sink: Arc<dyn ScrapeLogSink>,
    make_fetcher: F,
) -> Result<RunSummary>
where
    F: Fn() -> Result<Arc<dyn Fetcher>>,
{
    let start = Utc::now();
    let concurrency = config.crawler.max_concurrent_sites.max(1);
    log::info!(
        "Scraping {} sites (last {} days, {} at a time)",
        sites.len(),
        days,
        concurrency
    );

    let mut jobs = Vec::with_capacity(sites.len());
    for url in sites {
        let orchestrator = ScraperOrchestrator::new(
            make_fetcher()?,
            config,
            Arc::clone(&store),
            Arc::clone(&log_sink),
        );
        jobs.push((url, orchestrator));
    }

    let mut reports = stream::iter(jobs)
        .map(|(url, orchestrator)| async move { orchestrator.scrape_site(url, days).await })
        .buffer_unordered(concurrency);

    let mut summary = RunSummary::default();
    while let Some(report) = reports.next().await {
        summary.add(&report);
    }

    log::info!(
        "Batch finished in {}s",
        (Utc::now() - start).num_seconds()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: ScrapeStatus, strategy: Option<OriginStrategy>, count: usize) -> SiteReport {
        SiteReport {
            url: "https://x.test".to_string(),
            site_id: "x.test".to_string(),
            article_count: count,
            strategy_used: strategy,
            site_type: strategy.map(Into::into).unwrap_or_default(),
            status,
            message: String::new(),
            articles: Vec::new(),
        }
    }

    #[test]
    fn test_summary_totals() {
        let mut summary = RunSummary::default();
        summary.add(&report(ScrapeStatus::Success, Some(OriginStrategy::Feed), 4));
        summary.add(&report(ScrapeStatus::Success, Some(OriginStrategy::Feed), 2));
        summary.add(&report(ScrapeStatus::Partial, Some(OriginStrategy::StructuredApi), 0));
        summary.add(&report(ScrapeStatus::Error, None, 0));

        assert_eq!(summary.total_sites, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_articles, 6);
        assert_eq!(summary.by_strategy.get("feed"), Some(&2));
        assert_eq!(summary.by_strategy.get("structured_api"), Some(&1));
        assert_eq!(summary.sites.len(), 4);
    }
}
