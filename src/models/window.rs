//! Recency window shared by all strategies.

use chrono::{DateTime, Duration, Utc};

/// Inclusion filter: anything published before `cutoff` is excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub cutoff: DateTime<Utc>,
}

impl DateWindow {
    /// Window covering the last `days` days from now.
    pub fn last_days(days: u32) -> Self {
        Self::ending_at(Utc::now(), days)
    }

    /// Window covering the `days` days before `now`.
    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            cutoff: now - Duration::days(i64::from(days)),
        }
    }

    pub fn contains(&self, published_at: &DateTime<Utc>) -> bool {
        *published_at >= self.cutoff
    }
}
