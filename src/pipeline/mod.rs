//! Pipeline entry points for scraping.
//!
//! - `ScraperOrchestrator`: strategy fallback for a single site
//! - `run_scrape`: a batch of sites with bounded cross-site concurrency

pub mod orchestrator;
pub mod scrape;

pub use orchestrator::{ScraperOrchestrator, SiteReport};
pub use scrape::{RunSummary, SiteSummary, run_scrape, run_scrape_with};
