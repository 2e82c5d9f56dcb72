// src/config.rs

//! Configuration loading utilities.
//!
//! Convenience functions for loading the TOML configuration and the list
//! of sites to scrape.

use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, Site};

/// Load configuration from a TOML file.
///
/// Falls back to defaults when the file is missing; a file that exists but
/// does not parse is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::warn!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let config = Config::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse a site list: one URL per line, `#` starts a comment, blank lines
/// are ignored.
pub fn parse_sites(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Load the site list from a file.
pub fn load_sites(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::config(format!("Cannot read sites file {}: {e}", path.display()))
    })?;
    let sites = parse_sites(&content);
    if sites.is_empty() {
        return Err(AppError::config(format!(
            "No sites listed in {}",
            path.display()
        )));
    }
    Ok(sites)
}

/// Check every listed site URL; returns the ones that are invalid with
/// the reason.
pub fn invalid_sites(sites: &[String]) -> Vec<(String, AppError)> {
    sites
        .iter()
        .filter_map(|url| Site::from_url(url).err().map(|e| (url.clone(), e)))
        .collect()
}

/// Load and validate both config and site list.
pub fn load_all(config_path: &Path, sites_path: &Path) -> Result<(Config, Vec<String>)> {
    let config = load_config(config_path)?;
    let sites = load_sites(sites_path)?;
    Ok((config, sites))
}
