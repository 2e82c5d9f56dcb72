//! Utility functions and helpers.

pub mod date;
pub mod http;
pub mod text;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// Fragments are dropped so `page#comments` and `page` collapse to one URL.
/// Returns `None` for hrefs that do not produce an http(s) URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut joined = base.join(href).ok()?;
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    joined.set_fragment(None);
    Some(joined.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    resolve_url(&base, href)
}

/// Compare two hosts, ignoring a leading `www.`.
pub fn same_host(a: &str, b: &str) -> bool {
    let strip = |h: &str| h.strip_prefix("www.").unwrap_or(h).to_string();
    strip(&a.to_lowercase()) == strip(&b.to_lowercase())
}

/// Display name for a site id: first host label, capitalized.
pub fn site_name(site_id: &str) -> String {
    let label = site_id.split('.').next().unwrap_or(site_id);
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
