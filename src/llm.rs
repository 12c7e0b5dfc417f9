use std::str::FromStr;
use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::prompt::{PromptTemplate, RewriteRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Gemini,
    OpenAi,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Gemini => "Gemini",
            Backend::OpenAi => "OpenAI",
        }
    }

    pub fn api_key_var(self) -> &'static str {
        match self {
            Backend::Gemini => "GEMINI_API_KEY",
            Backend::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Backend::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Backend::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Backend::Gemini => "gemini-pro",
            Backend::OpenAi => "gpt-3.5-turbo",
        }
    }

    pub fn default_generation(self) -> GenerationConfig {
        match self {
            Backend::Gemini => GenerationConfig {
                temperature: 0.8,
                top_p: Some(0.95),
                max_output_tokens: 2500,
            },
            Backend::OpenAi => GenerationConfig {
                temperature: 0.7,
                top_p: None,
                max_output_tokens: 2000,
            },
        }
    }
}

impl FromStr for Backend {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Backend::Gemini),
            "openai" => Ok(Backend::OpenAi),
            other => Err(AppError::Config(format!("Unknown rewrite backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct RewriteConfig {
    pub backend: Backend,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub template: PromptTemplate,
    pub generation: GenerationConfig,
    pub timeout: Duration,
}

impl RewriteConfig {
    /// Backend defaults with no credential.
    pub fn for_backend(backend: Backend) -> Self {
        Self {
            backend,
            api_key: None,
            model: backend.default_model().to_string(),
            base_url: backend.default_base_url().to_string(),
            template: PromptTemplate::default(),
            generation: backend.default_generation(),
            timeout: Duration::from_secs(60),
        }
    }
}

// Gemini generateContent wire types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

// OpenAI chat completions wire types

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Sends assembled prompts to the configured generation backend.
pub struct RewriteClient {
    client: Client,
    config: RewriteConfig,
}

impl RewriteClient {
    pub fn new(config: RewriteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Builds the prompt and makes exactly one generation call.
    ///
    /// The credential is checked first; without one no request is sent.
    pub async fn rewrite(&self, request: &RewriteRequest) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Config(format!("{} not configured", self.config.backend.api_key_var()))
            })?;

        let prompt = self.config.template.build(request);
        debug!(chars = prompt.chars().count(), template = ?self.config.template, "built prompt");

        let start = Instant::now();
        let text = match self.config.backend {
            Backend::Gemini => self.call_gemini(api_key, &prompt).await?,
            Backend::OpenAi => self.call_openai(api_key, &prompt).await?,
        };
        info!(
            backend = self.config.backend.name(),
            chars = text.chars().count(),
            elapsed = ?start.elapsed(),
            "rewrite completed"
        );

        Ok(text)
    }

    async fn call_gemini(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let generation = self.config.generation;
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: generation.temperature,
                top_p: generation.top_p,
                max_output_tokens: generation.max_output_tokens,
            },
        };

        let res = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;
        let res = self.check_status(res).await?;

        let parsed: GeminiResponse = res.json().await.map_err(|_| self.invalid_response())?;
        parsed
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| self.invalid_response())
    }

    async fn call_openai(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let generation = self.config.generation;
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: generation.temperature,
            top_p: generation.top_p,
            max_tokens: generation.max_output_tokens,
        };

        let res = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let res = self.check_status(res).await?;

        let parsed: ChatResponse = res.json().await.map_err(|_| self.invalid_response())?;
        parsed
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| self.invalid_response())
    }

    /// Turns a non-2xx reply into an upstream error carrying `error.message` when the body has one.
    async fn check_status(&self, res: Response) -> Result<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|detail| detail.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("{} API error", self.config.backend.name()));
        debug!(%status, "generation API rejected request");

        Err(AppError::Upstream(message))
    }

    fn invalid_response(&self) -> AppError {
        AppError::Upstream(format!("Invalid response from {} API", self.config.backend.name()))
    }
}
