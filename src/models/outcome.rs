//! Per-run scrape outcome, appended to the scrape log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::OriginStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    Success,
    Partial,
    Error,
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One entry per orchestrator run per site. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeOutcome {
    pub site_id: String,

    /// Winning strategy, `None` when every strategy came back empty
    pub strategy_used: Option<OriginStrategy>,

    /// Articles the winning strategy produced
    pub articles_found: usize,

    /// Articles that were new to the store
    #[serde(default)]
    pub articles_saved: usize,

    pub status: ScrapeStatus,

    pub message: String,

    pub recorded_at: DateTime<Utc>,
}
