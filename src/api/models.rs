use serde::{Deserialize, Serialize};

/// Body of `POST /api/rewrite`. Every field is optional at the wire level so that
/// a missing `url` is reported as a 400 rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequestBody {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub style: Option<String>,
    pub custom_prompt: Option<String>,
    pub custom_format: Option<String>,
}

impl RewriteRequestBody {
    /// The target url, if present and not blank.
    pub fn target_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteResponse {
    pub success: bool,
    pub content: String,
    pub original_length: usize,
    pub rewritten_length: usize,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
