use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::extract::{ExtractedArticle, extract_text, truncate_article};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Placeholder replaced by the url-encoded target in a proxy template.
pub const URL_PLACEHOLDER: &str = "{url}";

/// How a proxy hands back the page it fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"contents": "<html>..."}`
    JsonEnvelope,
    /// The page itself.
    RawBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyProvider {
    pub name: String,
    pub template: String,
    pub shape: ResponseShape,
}

impl ProxyProvider {
    pub fn new(name: impl Into<String>, template: impl Into<String>, shape: ResponseShape) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            shape,
        }
    }

    /// The public CORS proxies, in the order they are tried.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "allorigins",
                "https://api.allorigins.win/get?url={url}",
                ResponseShape::JsonEnvelope,
            ),
            Self::new("corsproxy", "https://corsproxy.io/?{url}", ResponseShape::RawBody),
            Self::new(
                "codetabs",
                "https://api.codetabs.com/v1/proxy?quest={url}",
                ResponseShape::RawBody,
            ),
        ]
    }

    pub fn request_url(&self, target: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        self.template.replace(URL_PLACEHOLDER, &encoded)
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub providers: Vec<ProxyProvider>,
    pub timeout: Duration,
    pub min_length: usize,
    pub max_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            providers: ProxyProvider::defaults(),
            timeout: Duration::from_secs(15),
            min_length: 100,
            max_chars: 5000,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    contents: Option<String>,
}

/// Why a single proxy attempt was skipped. Only ever logged.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("body too short ({0} chars)")]
    TooShort(usize),
}

/// Runs `attempt` over `items` in order and returns the first `Ok`.
///
/// Attempts are awaited one at a time; later items are never started once an
/// earlier one succeeds. Failures are handed to `on_failure` and dropped.
pub async fn first_success<'a, I, T, E, F, Fut, L>(
    items: &'a [I],
    mut attempt: F,
    mut on_failure: L,
) -> Option<T>
where
    F: FnMut(&'a I) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    L: FnMut(&'a I, E),
{
    for item in items {
        match attempt(item).await {
            Ok(value) => return Some(value),
            Err(err) => on_failure(item, err),
        }
    }
    None
}

/// Pulls page text through the configured proxy list.
pub struct ContentFetcher {
    client: Client,
    config: FetchConfig,
}

impl ContentFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Raw text from the first proxy that yields a plausible page, or `None`
    /// once every proxy has failed.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let start = Instant::now();
        let text = first_success(
            &self.config.providers,
            |provider| self.attempt(provider, url),
            |provider, err| warn!(proxy = %provider.name, "proxy failed: {}", err),
        )
        .await;

        match &text {
            Some(text) => info!(chars = text.chars().count(), elapsed = ?start.elapsed(), "fetched content"),
            None => warn!(%url, elapsed = ?start.elapsed(), "all proxies failed"),
        }
        text
    }

    /// [`fetch`](Self::fetch), then markup stripping and the length ceiling.
    /// Pages that reduce to no text at all count as unavailable.
    pub async fn fetch_article(&self, url: &str) -> Option<ExtractedArticle> {
        let raw = self.fetch(url).await?;
        let text = extract_text(&raw);
        if text.is_empty() {
            warn!(%url, "page contained no text after extraction");
            return None;
        }

        let article = truncate_article(text, self.config.max_chars);
        debug!(chars = article.char_len(), truncated = article.truncated, "extracted article text");
        Some(article)
    }

    async fn attempt(&self, provider: &ProxyProvider, url: &str) -> std::result::Result<String, AttemptError> {
        let request_url = provider.request_url(url);
        debug!(proxy = %provider.name, "trying proxy");

        // Dropping the future on timeout cancels the request and frees its connection.
        tokio::time::timeout(self.config.timeout, self.download(provider, &request_url))
            .await
            .map_err(|_| AttemptError::Timeout(self.config.timeout))?
    }

    async fn download(&self, provider: &ProxyProvider, request_url: &str) -> std::result::Result<String, AttemptError> {
        let response = self.client.get(request_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        let text = match provider.shape {
            ResponseShape::JsonEnvelope => {
                let body = response.text().await?;
                let envelope: Envelope = serde_json::from_str(&body)?;
                envelope.contents.unwrap_or_default()
            }
            ResponseShape::RawBody => response.text().await?,
        };

        let len = text.chars().count();
        if len < self.config.min_length {
            return Err(AttemptError::TooShort(len));
        }
        Ok(text)
    }
}
