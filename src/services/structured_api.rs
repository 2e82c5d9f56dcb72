// src/services/structured_api.rs

//! WordPress REST API strategy.
//!
//! Detection hits the API root and then a one-post probe so that a site
//! advertising the API but protecting the posts route (401/403) is reported
//! as blocked rather than failed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, OriginStrategy, Site};
use crate::services::strategy::{ArticleDraft, ScrapeContext, Strategy, StrategyResult, pause};
use crate::utils::date::parse_datetime;
use crate::utils::http::Fetcher;
use crate::utils::text::{html_to_text, truncate_graphemes};

const API_ROOT: &str = "/wp-json/";
const POSTS_ROUTE: &str = "/wp-json/wp/v2/posts";
const NAMESPACE_MARKER: &str = "wp/v2";

/// Result of probing a site for the structured API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAvailability {
    Accessible,
    /// Present but protected (401/403)
    Blocked(u16),
    NotSupported(String),
}

/// Pulls recent posts from a WordPress REST API.
pub struct StructuredApiStrategy {
    fetcher: Arc<dyn Fetcher>,
    page_size: usize,
    max_pages: usize,
    delay: Duration,
    min_body_chars: usize,
    max_body_chars: usize,
    excerpt_chars: usize,
}

impl StructuredApiStrategy {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            page_size: config.scrape.api_page_size,
            max_pages: config.scrape.api_max_pages,
            delay: config.crawler.request_delay(),
            min_body_chars: config.scrape.min_body_chars,
            max_body_chars: config.scrape.max_body_chars,
            excerpt_chars: config.scrape.excerpt_chars,
        }
    }

    /// Probe the API root and the posts route.
    pub async fn detect(&self, site: &Site) -> ApiAvailability {
        let root = match self.fetcher.fetch(&site.url_for(API_ROOT)).await {
            Ok(response) => response,
            Err(e) if e.is_blocked() => return ApiAvailability::Blocked(e.status().unwrap_or(403)),
            Err(e) => return ApiAvailability::NotSupported(e.to_string()),
        };
        if !has_namespace(&root.body) {
            return ApiAvailability::NotSupported(format!(
                "API root does not list the {NAMESPACE_MARKER} namespace"
            ));
        }

        let probe = format!("{}?per_page=1", site.url_for(POSTS_ROUTE));
        match self.fetcher.fetch(&probe).await {
            Ok(_) => ApiAvailability::Accessible,
            Err(e) if e.is_blocked() => ApiAvailability::Blocked(e.status().unwrap_or(403)),
            Err(e) => ApiAvailability::NotSupported(e.to_string()),
        }
    }

    fn page_url(&self, site: &Site, page: usize, cutoff: DateTime<Utc>) -> Result<String> {
        let mut url = Url::parse(&site.url_for(POSTS_ROUTE))?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.page_size.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("orderby", "date")
            .append_pair("order", "desc")
            .append_pair("_embed", "true")
            .append_pair("after", &cutoff.to_rfc3339_opts(SecondsFormat::Secs, true));
        Ok(url.to_string())
    }

    fn to_draft(&self, post: WpPost) -> ArticleDraft {
        let published_at = post.published_at();
        let body = truncate_graphemes(&html_to_text(&post.content.rendered), self.max_body_chars);
        let embedded = post.embedded.unwrap_or_default();

        let mut categories = Vec::new();
        let mut tags = Vec::new();
        for term in embedded.terms.into_iter().flatten() {
            let name = html_to_text(&term.name);
            if name.is_empty() {
                continue;
            }
            match term.taxonomy.as_str() {
                "category" => categories.push(name),
                "post_tag" => tags.push(name),
                _ => {}
            }
        }

        ArticleDraft {
            url: post.link,
            title: html_to_text(&post.title.rendered),
            body,
            summary: html_to_text(&post.excerpt.rendered),
            author: embedded.author.into_iter().find_map(|a| a.name),
            published_at,
            image_url: embedded.featured_media.into_iter().find_map(|m| m.source_url),
            categories,
            tags,
        }
    }
}

#[async_trait]
impl Strategy for StructuredApiStrategy {
    fn origin(&self) -> OriginStrategy {
        OriginStrategy::StructuredApi
    }

    async fn attempt(&self, site: &Site, ctx: &ScrapeContext) -> Result<StrategyResult> {
        match self.detect(site).await {
            ApiAvailability::Accessible => {}
            ApiAvailability::Blocked(status) => {
                log::info!("[{}] Structured API is protected (HTTP {})", site.id, status);
                return Ok(StrategyResult::not_applicable(format!(
                    "structured API protected (HTTP {status})"
                )));
            }
            ApiAvailability::NotSupported(reason) => {
                log::debug!("[{}] No structured API: {}", site.id, reason);
                return Ok(StrategyResult::not_applicable("no structured API"));
            }
        }

        let mut result = StrategyResult::default();
        for page in 1..=self.max_pages {
            if ctx.deadline_reached() {
                result.interrupted = true;
                break;
            }
            if page > 1 {
                pause(self.delay).await;
            }

            let url = self.page_url(site, page, ctx.window.cutoff)?;
            let response = match self.fetcher.fetch(&url).await {
                Ok(response) => response,
                // Paging past the last page answers 400
                Err(e) if e.status() == Some(400) => break,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    log::warn!("[{}] API page {} failed: {}", site.id, page, e);
                    break;
                }
            };

            let posts: Vec<Value> = match serde_json::from_str(&response.body) {
                Ok(posts) => posts,
                Err(e) if page == 1 => return Err(AppError::parse(url, e)),
                Err(e) => {
                    log::warn!("[{}] API page {} is not a post list: {}", site.id, page, e);
                    break;
                }
            };
            if posts.is_empty() {
                break;
            }

            let mut crossed_window = false;
            for value in posts {
                let post: WpPost = match serde_json::from_value(value) {
                    Ok(post) => post,
                    Err(e) => {
                        log::debug!("[{}] Skipping malformed post: {}", site.id, e);
                        result.skipped += 1;
                        continue;
                    }
                };
                if let Some(date) = post.published_at() {
                    if !ctx.window.contains(&date) {
                        result.out_of_window += 1;
                        crossed_window = true;
                        continue;
                    }
                }
                let draft = self.to_draft(post);
                match draft.into_article(site, self.origin(), self.excerpt_chars, self.min_body_chars) {
                    Ok(article) => result.articles.push(article),
                    Err(e) => {
                        log::debug!("[{}] Skipping post: {}", site.id, e);
                        result.skipped += 1;
                    }
                }
                if result.is_full(ctx.max_articles) {
                    break;
                }
            }

            log::debug!(
                "[{}] API page {}: {} articles so far",
                site.id,
                page,
                result.articles.len()
            );
            if crossed_window || result.is_full(ctx.max_articles) {
                break;
            }
        }

        Ok(result)
    }
}

fn has_namespace(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|root| {
            root.get("namespaces")?
                .as_array()
                .map(|ns| ns.iter().any(|n| n.as_str() == Some(NAMESPACE_MARKER)))
        })
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct WpPost {
    link: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_gmt: Option<String>,
    title: Rendered,
    #[serde(default)]
    content: Rendered,
    #[serde(default)]
    excerpt: Rendered,
    #[serde(default, rename = "_embedded")]
    embedded: Option<WpEmbedded>,
}

impl WpPost {
    /// `date_gmt` when present, else the site-local `date` taken as UTC.
    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.date_gmt
            .as_deref()
            .and_then(parse_datetime)
            .or_else(|| self.date.as_deref().and_then(parse_datetime))
    }
}

#[derive(Debug, Default, Deserialize)]
struct Rendered {
    #[serde(default)]
    rendered: String,
}

#[derive(Debug, Default, Deserialize)]
struct WpEmbedded {
    #[serde(default)]
    author: Vec<WpAuthor>,
    #[serde(default, rename = "wp:featuredmedia")]
    featured_media: Vec<WpMedia>,
    #[serde(default, rename = "wp:term")]
    terms: Vec<Vec<WpTerm>>,
}

#[derive(Debug, Deserialize)]
struct WpAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WpMedia {
    #[serde(default)]
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WpTerm {
    #[serde(default)]
    taxonomy: String,
    #[serde(default)]
    name: String,
}
