// src/lib.rs

//! mediascan: collects recent articles from news sites.
//!
//! Each site is tried with a WordPress REST API strategy, then an RSS/Atom
//! feed strategy, then heuristic HTML scraping; the first strategy that
//! yields articles wins.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
