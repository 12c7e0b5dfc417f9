use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::fetcher::FetchConfig;
use crate::llm::{Backend, RewriteConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub fetch: FetchConfig,
    pub rewrite: RewriteConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, applying defaults for
    /// unset keys. A missing API key is not an error here; rewrite calls fail
    /// with a configuration error instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or(&get, "PORT", 3000)?;
        let ip = IpAddr::from_str(host.trim())
            .map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;
        let server_addr = SocketAddr::new(ip, port);

        let defaults = FetchConfig::default();
        let fetch = FetchConfig {
            timeout: Duration::from_secs(parse_or(&get, "PROXY_TIMEOUT_SECS", defaults.timeout.as_secs())?),
            min_length: parse_or(&get, "MIN_CONTENT_LENGTH", defaults.min_length)?,
            max_chars: parse_or(&get, "MAX_CONTENT_CHARS", defaults.max_chars)?,
            providers: defaults.providers,
        };

        let backend: Backend = parse_or(&get, "REWRITE_BACKEND", Backend::default())?;
        let mut rewrite = RewriteConfig::for_backend(backend);
        rewrite.api_key = get(backend.api_key_var());
        if let Some(model) = get("REWRITE_MODEL") {
            rewrite.model = model;
        }
        if let Some(base_url) = get("REWRITE_BASE_URL") {
            rewrite.base_url = base_url;
        }
        rewrite.template = parse_or(&get, "PROMPT_TEMPLATE", rewrite.template)?;
        rewrite.generation.temperature = parse_or(&get, "REWRITE_TEMPERATURE", rewrite.generation.temperature)?;
        if let Some(top_p) = get("REWRITE_TOP_P") {
            rewrite.generation.top_p = Some(parse_value("REWRITE_TOP_P", &top_p)?);
        }
        rewrite.generation.max_output_tokens =
            parse_or(&get, "REWRITE_MAX_TOKENS", rewrite.generation.max_output_tokens)?;
        rewrite.timeout = Duration::from_secs(parse_or(&get, "REWRITE_TIMEOUT_SECS", rewrite.timeout.as_secs())?);

        Ok(Config {
            server_addr,
            fetch,
            rewrite,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}
