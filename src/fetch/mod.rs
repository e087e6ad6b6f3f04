//! HTTP event source.
//!
//! Reads month files from a deployed copy of the site, at
//! `<base_url>/data/events/YYYY-MM.json`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::{EventRecord, YearMonth};
use crate::storage::{decode_events, EventSource, StorageError};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for the HTTP source.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Site root; month files live under `data/events/`
    pub base_url: Url,

    /// Maximum month file size (default 10MB)
    pub max_content_size: usize,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl FetcherConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            max_content_size: 10 * 1024 * 1024,
            timeout: Duration::from_secs(30),
            user_agent: concat!("community-meta/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches month files over HTTP.
pub struct HttpEventSource {
    client: Client,
    config: FetcherConfig,
}

impl HttpEventSource {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("community-meta")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Parse `base_url` and build a source with default settings.
    pub fn from_base_url(base_url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Self::new(FetcherConfig::new(url))
    }

    /// URL of the month file for `month`.
    pub fn month_url(&self, month: YearMonth) -> Result<Url, FetchError> {
        let mut base = self.config.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("data/events/{}", month.file_name()))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }

    async fn get_json(&self, url: &Url) -> Result<Vec<EventRecord>, FetchError> {
        debug!("Fetching {}", url);

        let mut response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let max_size = self.config.max_content_size;
        if let Some(size) = response.content_length() {
            let size = usize::try_from(size).unwrap_or(usize::MAX);
            if size > max_size {
                return Err(FetchError::ContentTooLarge { size, max_size });
            }
        }

        // Content-Length can be missing or wrong.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let size = body.len().saturating_add(chunk.len());
            if size > max_size {
                return Err(FetchError::ContentTooLarge { size, max_size });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(decode_events(&body, url.as_str())?)
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch_month(&self, month: YearMonth) -> Result<Vec<EventRecord>, StorageError> {
        let url = self.month_url(month)?;
        Ok(self.get_json(&url).await?)
    }

    fn location(&self, month: YearMonth) -> String {
        self.month_url(month)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| month.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_month_url_keeps_base_path() {
        let source = HttpEventSource::from_base_url("https://example.com/community").unwrap();
        assert_eq!(
            source.month_url(ym(2026, 3)).unwrap().as_str(),
            "https://example.com/community/data/events/2026-03.json"
        );

        let source = HttpEventSource::from_base_url("https://example.com/").unwrap();
        assert_eq!(
            source.month_url(ym(2026, 11)).unwrap().as_str(),
            "https://example.com/data/events/2026-11.json"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpEventSource::from_base_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_fetcher_config_default() {
        let config = FetcherConfig::new(Url::parse("https://example.com").unwrap());

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("community-meta/"));
    }

    #[tokio::test]
    async fn test_fetch_month_over_http() {
        let router = Router::new().route(
            "/data/events/2026-10.json",
            get(|| async { r#"[{"id":"E1","title":"Remote Open","when":"2026-10-03"}]"# }),
        );
        let base = serve(router).await;
        let source = HttpEventSource::from_base_url(&base).unwrap();

        let events = source.fetch_month(ym(2026, 10)).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Remote Open");
    }

    #[tokio::test]
    async fn test_oversized_month_is_rejected() {
        let router = Router::new().route(
            "/data/events/2026-10.json",
            get(|| async { format!("[{}]", vec!["{\"id\":\"E\"}"; 200].join(",")) }),
        );
        let base = serve(router).await;
        let mut config = FetcherConfig::new(Url::parse(&base).unwrap());
        config.max_content_size = 256;
        let source = HttpEventSource::new(config).unwrap();

        let err = source.fetch_month(ym(2026, 10)).await.unwrap_err();

        assert!(matches!(
            err,
            StorageError::Fetch(FetchError::ContentTooLarge { max_size: 256, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_month_is_an_error() {
        let base = serve(Router::new()).await;
        let source = HttpEventSource::from_base_url(&base).unwrap();

        let err = source.fetch_month(ym(2026, 9)).await.unwrap_err();

        assert!(matches!(
            err,
            StorageError::Fetch(FetchError::HttpStatus { status: 404, .. })
        ));
    }
}
