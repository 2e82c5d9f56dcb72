// src/services/extractor.rs

//! Field extraction from a single article page.
//!
//! Each field is located by walking an ordered list of CSS selectors
//! covering the common CMS themes and taking the first acceptable match.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ArticleFields, DateSource, ScrapeConfig};
use crate::utils::date::{date_from_url, parse_datetime, parse_fuzzy_date};
use crate::utils::resolve;
use crate::utils::text::{SKIPPED_TAGS, element_text, inline_text, truncate_graphemes};

const TITLE_SELECTORS: &[&str] = &[
    "article h1",
    ".entry-title",
    ".post-title",
    "h1.title",
    "h1.article-title",
    ".article-header h1",
    "header h1",
    "h1",
];

const BODY_SELECTORS: &[&str] = &[
    "article .entry-content",
    "article .post-content",
    "article .content",
    ".entry-content",
    ".post-content",
    ".article-content",
    r#"[itemprop="articleBody"]"#,
    ".article-body",
    "main article",
    "article",
    ".content",
];

const META_DATE_SELECTORS: &[&str] = &[
    r#"meta[property="article:published_time"]"#,
    r#"meta[property="og:published_time"]"#,
    r#"meta[name="publish_date"]"#,
    r#"meta[name="date"]"#,
    r#"[itemprop="datePublished"]"#,
];

const DATE_TEXT_SELECTORS: &[&str] = &[
    ".entry-date",
    ".post-date",
    ".published",
    ".date",
    "time",
    ".article-date",
    "span.date",
];

const AUTHOR_SELECTORS: &[&str] = &[".author-name", ".author", ".by-author", r#"a[rel="author"]"#];

const IMAGE_SELECTORS: &[&str] = &[
    "article img",
    ".entry-content img",
    ".post-thumbnail img",
    ".featured-image img",
];

/// Author names longer than this are page furniture, not bylines.
const MAX_AUTHOR_CHARS: usize = 100;

/// Extracts title, body, date, author and image from article HTML.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    min_title_chars: usize,
    min_body_chars: usize,
    max_body_chars: usize,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(&ScrapeConfig::default())
    }
}

impl FieldExtractor {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            min_title_chars: config.min_title_chars,
            min_body_chars: config.min_body_chars,
            max_body_chars: config.max_body_chars,
        }
    }

    /// Parse `html` and extract article fields.
    pub fn extract(&self, html: &str, page_url: &str) -> Result<ArticleFields> {
        let document = Html::parse_document(html);
        self.extract_document(&document, page_url)
    }

    /// Extract article fields from an already-parsed document.
    ///
    /// Fails with `InsufficientContent` when no title or body meets the
    /// configured minimum length.
    pub fn extract_document(&self, document: &Html, page_url: &str) -> Result<ArticleFields> {
        let title = self
            .extract_title(document)
            .ok_or_else(|| AppError::insufficient(page_url, "no usable title"))?;

        let body = self.extract_body(document).ok_or_else(|| {
            AppError::insufficient(
                page_url,
                format!("no body longer than {} chars", self.min_body_chars),
            )
        })?;

        let (published_at, date_source) = match extract_date(document, page_url) {
            Some((date, source)) => (Some(date), Some(source)),
            None => (None, None),
        };

        Ok(ArticleFields {
            title,
            body,
            published_at,
            date_source,
            author: extract_author(document),
            image_url: extract_image(document, page_url),
        })
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        for css in TITLE_SELECTORS {
            if let Some(text) = first_match(document, css).map(inline_text) {
                if text.chars().count() >= self.min_title_chars {
                    return Some(text);
                }
            }
        }

        if let Some(og) = meta_content(document, r#"meta[property="og:title"]"#) {
            if og.chars().count() >= self.min_title_chars {
                return Some(og);
            }
        }

        first_match(document, "title")
            .map(inline_text)
            .map(|t| strip_site_suffix(&t))
            .filter(|t| t.chars().count() >= self.min_title_chars)
    }

    fn extract_body(&self, document: &Html) -> Option<String> {
        for css in BODY_SELECTORS {
            let Some(container) = first_match(document, css) else {
                continue;
            };
            let text = container_text(container);
            if text.chars().count() > self.min_body_chars {
                return Some(truncate_graphemes(&text, self.max_body_chars));
            }
        }
        None
    }
}

/// Paragraph text of a body container, falling back to all of its text
/// when it has no paragraphs outside skipped subtrees.
fn container_text(container: ElementRef) -> String {
    let Ok(paragraph) = Selector::parse("p") else {
        return element_text(container, SKIPPED_TAGS);
    };

    let paragraphs: Vec<String> = container
        .select(&paragraph)
        .filter(|p| !inside_skipped(*p, container))
        .map(|p| element_text(p, SKIPPED_TAGS))
        .filter(|text| !text.is_empty())
        .collect();

    if paragraphs.is_empty() {
        element_text(container, SKIPPED_TAGS)
    } else {
        paragraphs.join("\n\n")
    }
}

fn inside_skipped(element: ElementRef, container: ElementRef) -> bool {
    element
        .ancestors()
        .take_while(|node| node.id() != container.id())
        .filter_map(|node| node.value().as_element())
        .any(|el| SKIPPED_TAGS.contains(&el.name()))
}

/// Publish date and where it was found, trying metadata, `<time>`
/// attributes, visible date text and finally the URL path.
pub fn extract_date(document: &Html, page_url: &str) -> Option<(DateTime<Utc>, DateSource)> {
    date_from_metadata(document)
        .map(|d| (d, DateSource::Metadata))
        .or_else(|| date_from_time_element(document).map(|d| (d, DateSource::TimeElement)))
        .or_else(|| date_from_visible_text(document).map(|d| (d, DateSource::VisibleText)))
        .or_else(|| date_from_url(page_url).map(|d| (d, DateSource::UrlPath)))
}

fn date_from_metadata(document: &Html) -> Option<DateTime<Utc>> {
    META_DATE_SELECTORS.iter().find_map(|css| {
        let selector = parse_selector(css).ok()?;
        document.select(&selector).find_map(|el| {
            let value = el.value();
            value
                .attr("content")
                .or_else(|| value.attr("datetime"))
                .and_then(parse_datetime)
        })
    })
}

fn date_from_time_element(document: &Html) -> Option<DateTime<Utc>> {
    let selector = parse_selector("time[datetime]").ok()?;
    document
        .select(&selector)
        .find_map(|el| el.value().attr("datetime").and_then(parse_datetime))
}

fn date_from_visible_text(document: &Html) -> Option<DateTime<Utc>> {
    DATE_TEXT_SELECTORS.iter().find_map(|css| {
        let selector = parse_selector(css).ok()?;
        document
            .select(&selector)
            .find_map(|el| parse_fuzzy_date(&inline_text(el)))
    })
}

/// Byline from `<meta name="author">` or a common author element.
pub fn extract_author(document: &Html) -> Option<String> {
    let plausible = |name: &String| !name.is_empty() && name.chars().count() < MAX_AUTHOR_CHARS;

    meta_content(document, r#"meta[name="author"]"#)
        .filter(plausible)
        .or_else(|| {
            AUTHOR_SELECTORS
                .iter()
                .filter_map(|css| first_match(document, css))
                .map(inline_text)
                .find(plausible)
        })
}

/// Lead image URL, made absolute against `page_url`.
pub fn extract_image(document: &Html, page_url: &str) -> Option<String> {
    meta_content(document, r#"meta[property="og:image"]"#)
        .and_then(|src| resolve(page_url, &src))
        .or_else(|| {
            IMAGE_SELECTORS.iter().find_map(|css| {
                let img = first_match(document, css)?;
                let src = img
                    .value()
                    .attr("src")
                    .or_else(|| img.value().attr("data-src"))?;
                resolve(page_url, src)
            })
        })
}

/// Keep the headline part of a `<title>`: drop everything after `|` and a
/// trailing ` - Site` / ` – Site` segment.
fn strip_site_suffix(title: &str) -> String {
    let head = title.split('|').next().unwrap_or(title).trim();
    [" - ", " – ", " — "]
        .iter()
        .filter_map(|sep| head.rfind(sep))
        .max()
        .map_or(head, |idx| head[..idx].trim())
        .to_string()
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    first_match(document, css)
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = parse_selector(css).ok()?;
    document.select(&selector).next()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
