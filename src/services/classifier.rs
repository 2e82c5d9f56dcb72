//! Article URL classification.
//!
//! Decides, without any site-specific configuration, whether a discovered
//! link plausibly points at an article page. False positives are expected;
//! the field extractor's minimum-content check filters them out later.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::utils::same_host;

/// Taxonomy and listing segments.
const LISTING_SEGMENTS: &[&str] = &[
    "category", "categories", "tag", "tags", "author", "authors", "page", "search",
    "archive", "archives",
];

/// Platform-internal segments.
const PLATFORM_SEGMENTS: &[&str] = &[
    "wp-admin", "wp-content", "wp-includes", "wp-json", "wp-login.php", "xmlrpc.php",
    "feed", "rss", "atom", "cdn-cgi", "cgi-bin", "comments", "comment", "reply",
];

/// Static pages, matched against whole segments only.
const STATIC_SEGMENTS: &[&str] = &[
    "contact", "contact-us", "nous-contacter", "nous-ecrire", "about", "about-us",
    "a-propos", "qui-sommes-nous", "notre-equipe", "mentions-legales",
    "politique-de-confidentialite", "privacy", "privacy-policy", "conditions",
    "conditions-generales", "cgu", "terms", "terms-of-use", "terms-and-conditions",
    "legal", "mon-compte", "login", "register",
];

/// Non-document file extensions.
const EXCLUDED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp", "pdf", "doc", "docx", "xls",
    "xlsx", "ppt", "pptx", "zip", "rar", "tar", "gz", "7z", "mp3", "mp4", "avi", "mov",
    "wav", "ogg", "webm", "css", "js", "json", "xml",
];

/// Bare date archive paths: `/2024`, `/2024/05`, `/news/2024/05/12`.
static ARCHIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)\d{4}(?:/\d{1,2}){0,2}$").expect("valid regex"));

/// Why a URL was not considered an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    InvalidUrl,
    CrossDomain,
    ExcludedPath(String),
    ExcludedExtension(String),
    BareDomain,
    ArchiveIndex,
}

/// Heuristic article-URL classifier.
#[derive(Debug, Clone, Default)]
pub struct ArticleUrlClassifier;

impl ArticleUrlClassifier {
    pub fn new() -> Self {
        Self
    }

    /// True when `candidate` is a plausible article page of the site at `site_base`.
    pub fn is_article(&self, candidate: &str, site_base: &str) -> bool {
        self.check(candidate, site_base).is_ok()
    }

    /// Apply the rules in order, reporting the first one that rejects.
    pub fn check(&self, candidate: &str, site_base: &str) -> Result<(), Rejection> {
        let candidate = Url::parse(candidate).map_err(|_| Rejection::InvalidUrl)?;
        let base = Url::parse(site_base).map_err(|_| Rejection::InvalidUrl)?;

        match (candidate.host_str(), base.host_str()) {
            (Some(c), Some(b)) if same_host(c, b) => {}
            _ => return Err(Rejection::CrossDomain),
        }

        let path = candidate.path().to_lowercase();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for segment in &segments {
            if LISTING_SEGMENTS.contains(segment)
                || PLATFORM_SEGMENTS.contains(segment)
                || STATIC_SEGMENTS.contains(segment)
            {
                return Err(Rejection::ExcludedPath((*segment).to_string()));
            }
        }

        if let Some(ext) = segments
            .last()
            .and_then(|last| last.rsplit_once('.'))
            .map(|(_, ext)| ext)
        {
            if EXCLUDED_EXTENSIONS.contains(&ext) {
                return Err(Rejection::ExcludedExtension(ext.to_string()));
            }
        }

        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Rejection::BareDomain);
        }
        if ARCHIVE_PATH.is_match(trimmed) {
            return Err(Rejection::ArchiveIndex);
        }

        Ok(())
    }
}
