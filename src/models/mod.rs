// src/models/mod.rs

//! Domain models for the scraper.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod article;
mod config;
mod outcome;
mod site;
mod window;

// Re-export all public types
pub use article::{Article, ArticleFields, DateSource, OriginStrategy};
pub use config::{Config, CrawlerConfig, LoggingConfig, PathsConfig, ScrapeConfig};
pub use outcome::{ScrapeOutcome, ScrapeStatus};
pub use site::{Site, SiteType};
pub use window::DateWindow;
