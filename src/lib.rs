pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod llm;
pub mod prompt;

use std::sync::Arc;
use config::Config;
use error::Result;
use fetcher::ContentFetcher;
use llm::RewriteClient;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<ContentFetcher>,
    pub rewriter: Arc<RewriteClient>,
}

impl AppState {
    pub fn new(fetcher: ContentFetcher, rewriter: RewriteClient) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            rewriter: Arc::new(rewriter),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            ContentFetcher::new(config.fetch.clone())?,
            RewriteClient::new(config.rewrite.clone())?,
        ))
    }
}
