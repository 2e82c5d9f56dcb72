//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── articles/             # {article_id}.json, written once
//! └── logs/
//!     └── YYYY/
//!         └── MM.json       # Scrape outcomes for the month, oldest first
//! ```
//!
//! Writes go to a temporary file and are renamed into place. A single
//! lock serializes the check-then-write of inserts and the
//! read-modify-write of log appends, so one `LocalStorage` can be shared
//! across concurrently scraped sites.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Article, ScrapeOutcome};
use crate::storage::{ArticleStore, InsertOutcome, ScrapeLogSink, article_id};

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn article_key(id: &str) -> String {
        format!("articles/{id}.json")
    }

    fn log_key(year: i32, month: u32) -> String {
        format!("logs/{}/{:02}.json", year, month)
    }

    /// Load a stored article by canonical URL.
    pub async fn load_article(&self, canonical_url: &str) -> Result<Option<Article>> {
        self.read_json(&Self::article_key(&article_id(canonical_url)))
            .await
    }

    /// Number of stored articles.
    pub async fn article_count(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(self.path("articles")).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::Io(e)),
        };
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Scrape outcomes recorded in the given month.
    pub async fn load_outcomes(&self, year: i32, month: u32) -> Result<Vec<ScrapeOutcome>> {
        let key = Self::log_key(year, month);
        match self.read_json(&key).await? {
            Some(outcomes) => Ok(outcomes),
            None => {
                log::warn!("No scrape log found for {}/{:02}", year, month);
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl ArticleStore for LocalStorage {
    async fn exists(&self, canonical_url: &str) -> Result<bool> {
        let key = Self::article_key(&article_id(canonical_url));
        Ok(tokio::fs::try_exists(self.path(&key)).await?)
    }

    async fn insert(&self, article: &Article) -> Result<InsertOutcome> {
        let _guard = self.lock.lock().await;
        let id = article_id(&article.canonical_url);
        let key = Self::article_key(&id);
        if tokio::fs::try_exists(self.path(&key)).await? {
            return Ok(InsertOutcome::AlreadyExists);
        }
        self.write_json(&key, article).await?;
        log::debug!("Stored {} as {}", article.canonical_url, key);
        Ok(InsertOutcome::Inserted(id))
    }
}

#[async_trait]
impl ScrapeLogSink for LocalStorage {
    async fn record(&self, outcome: &ScrapeOutcome) -> Result<()> {
        let _guard = self.lock.lock().await;
        let key = Self::log_key(outcome.recorded_at.year(), outcome.recorded_at.month());
        let mut outcomes: Vec<ScrapeOutcome> = self.read_json(&key).await?.unwrap_or_default();
        outcomes.push(outcome.clone());
        self.write_json(&key, &outcomes).await
    }
}
