//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mediascan::error::{AppError, Result};
use mediascan::models::Config;
use mediascan::utils::http::{FetchResponse, Fetcher};

type Handler = Box<dyn Fn(&str) -> Result<FetchResponse> + Send + Sync>;

enum Route {
    Page { content_type: String, body: String },
    Status(u16),
}

/// Serves canned responses and records every requested URL.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct FixtureFetcher {
    routes: HashMap<String, Route>,
    prefixes: Vec<(String, Handler)>,
    delays: Vec<(String, Duration)>,
    requests: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, content_type: &str, body: impl Into<String>) -> Self {
        self.routes.insert(
            url.to_string(),
            Route::Page {
                content_type: content_type.to_string(),
                body: body.into(),
            },
        );
        self
    }

    pub fn html(self, url: &str, body: impl Into<String>) -> Self {
        self.page(url, "text/html; charset=utf-8", body)
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_string(), Route::Status(status));
        self
    }

    /// Answer every URL starting with `prefix` (and not routed exactly) with `handler`.
    pub fn prefix<F>(mut self, prefix: &str, handler: F) -> Self
    where
        F: Fn(&str) -> Result<FetchResponse> + Send + Sync + 'static,
    {
        self.prefixes.push((prefix.to_string(), Box::new(handler)));
        self
    }

    /// Hold every response for a URL starting with `prefix` for `delay`.
    pub fn slow(mut self, prefix: &str, delay: Duration) -> Self {
        self.delays.push((prefix.to_string(), delay));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        if let Some((_, delay)) = self.delays.iter().find(|(p, _)| url.starts_with(p.as_str())) {
            tokio::time::sleep(*delay).await;
        }

        match self.routes.get(url) {
            Some(Route::Page { content_type, body }) => Ok(response(url, content_type, body)),
            Some(Route::Status(status)) => Err(AppError::http_status(url, *status)),
            None => match self.prefixes.iter().find(|(p, _)| url.starts_with(p.as_str())) {
                Some((_, handler)) => handler(url),
                None => Err(AppError::http_status(url, 404)),
            },
        }
    }
}

pub fn response(url: &str, content_type: &str, body: &str) -> FetchResponse {
    FetchResponse {
        url: url.to_string(),
        status: 200,
        headers: HashMap::from([("content-type".to_string(), content_type.to_string())]),
        body: body.to_string(),
    }
}

/// Defaults with politeness delays turned off.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_delay_ms = 0;
    config
}

/// An article page with a long enough title and body.
pub fn article_page(title: &str, published_meta: Option<&str>) -> String {
    let meta = published_meta
        .map(|d| format!(r#"<meta property="article:published_time" content="{d}">"#))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>{title} | Le Quotidien</title>{meta}</head>
        <body>
          <nav><a href="/">Accueil</a></nav>
          <article>
            <h1>{title}</h1>
            <div class="entry-content">
              <p>The regional council met on Tuesday to examine the draft budget for the coming year.</p>
              <p>After a long debate the proposal was adopted by a large majority of elected members.</p>
            </div>
          </article>
        </body></html>"#
    )
}
