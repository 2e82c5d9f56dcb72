//! Service layer for the scraper.
//!
//! This module contains the business logic for:
//! - Article URL classification (`ArticleUrlClassifier`)
//! - Per-page field extraction (`FieldExtractor`)
//! - The three scraping strategies, in priority order:
//!   `StructuredApiStrategy`, `FeedStrategy`, `HeuristicHtmlStrategy`

mod classifier;
mod extractor;
mod feed;
mod heuristic;
mod strategy;
mod structured_api;

pub use classifier::{ArticleUrlClassifier, Rejection};
pub use extractor::{FieldExtractor, extract_author, extract_date, extract_image};
pub use feed::{FeedEntry, FeedStrategy, parse_feed};
pub use heuristic::HeuristicHtmlStrategy;
pub use strategy::{ScrapeContext, Strategy, StrategyResult};
pub use structured_api::{ApiAvailability, StructuredApiStrategy};
