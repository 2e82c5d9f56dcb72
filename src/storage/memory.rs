//! In-memory storage, used for dry runs and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Article, ScrapeOutcome};
use crate::storage::{ArticleStore, InsertOutcome, ScrapeLogSink, article_id};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    articles: Mutex<HashMap<String, Article>>,
    outcomes: Mutex<Vec<ScrapeOutcome>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored articles, in no particular order.
    pub fn articles(&self) -> Vec<Article> {
        self.articles
            .lock()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Recorded outcomes, oldest first.
    pub fn outcomes(&self) -> Vec<ScrapeOutcome> {
        self.outcomes
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn exists(&self, canonical_url: &str) -> Result<bool> {
        Ok(self
            .articles
            .lock()
            .map(|map| map.contains_key(canonical_url))
            .unwrap_or(false))
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome> {
        let mut map = self.articles.lock().unwrap_or_else(|e| e.into_inner());
        if map.contains_key(&article.canonical_url) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        map.insert(article.canonical_url.clone(), article.clone());
        Ok(InsertOutcome::Inserted(article_id(&article.canonical_url)))
    }
}

#[async_trait]
impl ScrapeLogSink for MemoryStorage {
    async fn record(&self, outcome: &ScrapeOutcome) -> Result<()> {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(outcome.clone());
        Ok(())
    }
}
