//! Persistence for articles and scrape outcomes.
//!
//! The scraper only needs two capabilities from its host: insert-if-absent
//! keyed by canonical URL, and an append-only log of per-run outcomes.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── articles/             # One file per article, named by URL hash
//! │   └── 3f9a0c1be47d2a10.json
//! └── logs/                 # Scrape outcomes, appended per month
//!     └── 2024/
//!         └── 05.json
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::{Article, ScrapeOutcome};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Result of an insert-if-absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored under the returned id
    Inserted(String),
    /// An article with the same canonical URL was already stored
    AlreadyExists,
}

/// Article persistence keyed by canonical URL.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn exists(&self, canonical_url: &str) -> Result<bool>;

    /// Store `article` unless its canonical URL is already present.
    async fn insert(&self, article: &Article) -> Result<InsertOutcome>;
}

/// Append-only sink for scrape outcomes.
#[async_trait]
pub trait ScrapeLogSink: Send + Sync {
    async fn record(&self, outcome: &ScrapeOutcome) -> Result<()>;
}

/// Stable article id: first 16 hex chars of the SHA-256 of the canonical URL.
pub fn article_id(canonical_url: &str) -> String {
    let digest = Sha256::digest(canonical_url.as_bytes());
    hex::encode(digest)[..16].to_string()
}
