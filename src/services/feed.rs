// src/services/feed.rs

//! RSS/Atom feed strategy.
//!
//! The feed is found by probing conventional paths and then the homepage's
//! `<link rel="alternate">` declarations. Entries give the list of recent
//! articles; each one is then fetched to recover the full body.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Config, OriginStrategy, Site};
use crate::services::extractor::FieldExtractor;
use crate::services::strategy::{ArticleDraft, ScrapeContext, Strategy, StrategyResult, pause};
use crate::utils::http::{FetchResponse, Fetcher};
use crate::utils::resolve;
use crate::utils::text::{html_to_text, normalize_whitespace, truncate_graphemes};

const FEED_LINK_SELECTOR: &str =
    r#"link[type="application/rss+xml"], link[type="application/atom+xml"]"#;

/// A feed entry reduced to the fields we use.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: String,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub categories: Vec<String>,
}

/// Collects articles listed in a site's syndication feed.
pub struct FeedStrategy {
    fetcher: Arc<dyn Fetcher>,
    extractor: FieldExtractor,
    feed_paths: Vec<String>,
    delay: Duration,
    min_body_chars: usize,
    max_body_chars: usize,
    excerpt_chars: usize,
}

impl FeedStrategy {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            extractor: FieldExtractor::new(&config.scrape),
            feed_paths: config.scrape.feed_paths.clone(),
            delay: config.crawler.request_delay(),
            min_body_chars: config.scrape.min_body_chars,
            max_body_chars: config.scrape.max_body_chars,
            excerpt_chars: config.scrape.excerpt_chars,
        }
    }

    /// Locate and parse the site's feed. Returns the feed URL and its entries.
    pub async fn discover(&self, site: &Site) -> Option<(String, Vec<FeedEntry>)> {
        for path in &self.feed_paths {
            let url = site.url_for(path);
            match self.fetcher.fetch(&url).await {
                Ok(response) if looks_like_feed(&response) => match parse_feed(&response) {
                    Ok(entries) => return Some((response.url, entries)),
                    Err(e) => log::debug!("[{}] {} is not a usable feed: {}", site.id, url, e),
                },
                Ok(_) => {}
                Err(e) => log::debug!("[{}] No feed at {}: {}", site.id, url, e),
            }
        }

        // Fall back to the feed the homepage advertises.
        let homepage = self.fetcher.fetch(&site.base_url).await.ok()?;
        let advertised = advertised_feed(&homepage.body, &homepage.url)?;
        log::debug!("[{}] Homepage advertises feed {}", site.id, advertised);
        let response = self.fetcher.fetch(&advertised).await.ok()?;
        match parse_feed(&response) {
            Ok(entries) => Some((response.url, entries)),
            Err(e) => {
                log::debug!("[{}] Advertised feed is unusable: {}", site.id, e);
                None
            }
        }
    }

    /// Fetch an entry's page for the full body, falling back to the feed
    /// summary when extraction fails.
    async fn hydrate(&self, entry: &FeedEntry) -> Result<ArticleDraft> {
        let extracted = match self.fetcher.fetch(&entry.url).await {
            Ok(page) => self.extractor.extract(&page.body, &entry.url),
            Err(e) => Err(e),
        };

        let mut draft = ArticleDraft {
            url: entry.url.clone(),
            title: entry.title.clone(),
            summary: entry.summary.clone(),
            author: entry.author.clone(),
            published_at: entry.published_at,
            image_url: entry.image_url.clone(),
            categories: entry.categories.clone(),
            ..ArticleDraft::default()
        };

        match extracted {
            Ok(fields) => {
                draft.body = fields.body;
                draft.published_at = draft.published_at.or(fields.published_at);
                draft.author = draft.author.or(fields.author);
                draft.image_url = draft.image_url.or(fields.image_url);
            }
            Err(e) if entry.summary.chars().count() >= self.min_body_chars => {
                log::debug!("Using feed summary for {}: {}", entry.url, e);
                draft.body = truncate_graphemes(&entry.summary, self.max_body_chars);
            }
            Err(e) => return Err(e),
        }
        Ok(draft)
    }
}

#[async_trait]
impl Strategy for FeedStrategy {
    fn origin(&self) -> OriginStrategy {
        OriginStrategy::Feed
    }

    async fn attempt(&self, site: &Site, ctx: &ScrapeContext) -> Result<StrategyResult> {
        let Some((feed_url, entries)) = self.discover(site).await else {
            return Err(AppError::NoCandidates(format!("no feed found for {}", site.id)));
        };
        log::info!("[{}] Feed {} lists {} entries", site.id, feed_url, entries.len());

        let mut result = StrategyResult::default();
        let mut selected = Vec::new();
        for entry in entries {
            if entry.title.is_empty() || entry.url.is_empty() {
                result.skipped += 1;
                continue;
            }
            if entry.published_at.is_some_and(|d| !ctx.window.contains(&d)) {
                result.out_of_window += 1;
                continue;
            }
            if selected.len() < ctx.max_articles {
                selected.push(entry);
            }
        }

        for (i, entry) in selected.iter().enumerate() {
            if ctx.deadline_reached() {
                result.interrupted = true;
                break;
            }
            if i > 0 {
                pause(self.delay).await;
            }

            let draft = match self.hydrate(entry).await {
                Ok(draft) => draft,
                Err(e) => {
                    log::debug!("[{}] Dropping {}: {}", site.id, entry.url, e);
                    result.skipped += 1;
                    continue;
                }
            };
            // Undated entries are checked against the page's own date.
            if draft.published_at.is_some_and(|d| !ctx.window.contains(&d)) {
                result.out_of_window += 1;
                continue;
            }
            match draft.into_article(site, self.origin(), self.excerpt_chars, self.min_body_chars) {
                Ok(article) => result.articles.push(article),
                Err(e) => {
                    log::debug!("[{}] Dropping {}: {}", site.id, entry.url, e);
                    result.skipped += 1;
                }
            }
        }

        Ok(result)
    }
}

/// Content type or leading markup says this is a feed.
fn looks_like_feed(response: &FetchResponse) -> bool {
    let content_type = response.content_type();
    if ["xml", "rss", "atom"].iter().any(|t| content_type.contains(t)) {
        return true;
    }
    let head: String = response.body.chars().take(1024).collect();
    head.contains("<rss") || head.contains("<feed") || head.contains("<rdf:RDF")
}

/// Parse a feed document into entries with absolute URLs.
pub fn parse_feed(response: &FetchResponse) -> Result<Vec<FeedEntry>> {
    let feed = feed_rs::parser::parse(response.body.as_bytes())
        .map_err(|e| AppError::parse(response.url.clone(), e))?;
    Ok(feed
        .entries
        .into_iter()
        .map(|entry| feed_entry(entry, &response.url))
        .collect())
}

fn feed_entry(entry: Entry, feed_url: &str) -> FeedEntry {
    let url = entry
        .links
        .first()
        .and_then(|link| resolve(feed_url, &link.href))
        .unwrap_or_default();

    let image_url = entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .filter(|content| {
            content
                .content_type
                .as_ref()
                .is_none_or(|mime| mime.to_string().starts_with("image/"))
        })
        .find_map(|content| content.url.as_ref().map(|u| u.to_string()))
        .or_else(|| {
            entry
                .media
                .iter()
                .flat_map(|media| media.thumbnails.iter())
                .map(|thumb| thumb.image.uri.clone())
                .next()
        });

    FeedEntry {
        title: entry
            .title
            .map(|t| normalize_whitespace(&html_to_text(&t.content)))
            .unwrap_or_default(),
        url,
        published_at: entry.published.or(entry.updated),
        summary: entry
            .summary
            .map(|s| html_to_text(&s.content))
            .unwrap_or_default(),
        author: entry
            .authors
            .into_iter()
            .map(|p| p.name.trim().to_string())
            .find(|name| !name.is_empty()),
        image_url,
        categories: entry
            .categories
            .into_iter()
            .map(|c| c.term)
            .filter(|term| !term.is_empty())
            .collect(),
    }
}

/// First RSS/Atom feed declared in the homepage's `<head>`.
fn advertised_feed(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(FEED_LINK_SELECTOR).ok()?;
    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .find_map(|href| resolve(page_url, href))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Le Quotidien</title>
    <link>https://x.test/</link>
    <item>
      <title>Budget vote passes &amp; council adjourns</title>
      <link>/2024/05/12/budget-vote/</link>
      <pubDate>Sun, 12 May 2024 08:00:00 GMT</pubDate>
      <description>&lt;p&gt;The council approved the budget.&lt;/p&gt;</description>
      <category>Politique</category>
      <enclosure url="https://x.test/img/vote.jpg" type="image/jpeg" length="1000"/>
    </item>
    <item>
      <title>No date here</title>
      <link>https://x.test/undated/</link>
    </item>
  </channel>
</rss>"#;

    fn response(url: &str, content_type: &str, body: &str) -> FetchResponse {
        FetchResponse {
            url: url.to_string(),
            status: 200,
            headers: HashMap::from([("content-type".to_string(), content_type.to_string())]),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_parse_feed_entries() {
        let entries = parse_feed(&response("https://x.test/feed/", "application/rss+xml", RSS)).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title, "Budget vote passes & council adjourns");
        assert_eq!(first.url, "https://x.test/2024/05/12/budget-vote/");
        assert_eq!(
            first.published_at.map(|d| d.to_rfc3339()),
            Some("2024-05-12T08:00:00+00:00".to_string())
        );
        assert_eq!(first.summary, "The council approved the budget.");
        assert_eq!(first.categories, vec!["Politique".to_string()]);
        assert_eq!(first.image_url.as_deref(), Some("https://x.test/img/vote.jpg"));

        assert_eq!(entries[1].published_at, None);
    }

    #[test]
    fn test_looks_like_feed() {
        assert!(looks_like_feed(&response("u", "application/rss+xml; charset=utf-8", "")));
        assert!(looks_like_feed(&response("u", "text/plain", "<?xml version=\"1.0\"?><feed>")));
        assert!(!looks_like_feed(&response("u", "text/html", "<html><body>Home</body></html>")));
    }

    #[test]
    fn test_advertised_feed() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/style.css">
            <link rel="alternate" type="application/rss+xml" href="/index.php?format=feed">
        </head><body></body></html>"#;
        assert_eq!(
            advertised_feed(html, "https://x.test/").as_deref(),
            Some("https://x.test/index.php?format=feed")
        );
        assert_eq!(advertised_feed("<html></html>", "https://x.test/"), None);
    }

    #[test]
    fn test_invalid_feed_is_parse_error() {
        let err = parse_feed(&response("https://x.test/feed/", "text/xml", "<html>oops")).unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }
}
