use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;

const DETAILED_TEMPLATE: &str = include_str!("../templates/detailed.txt");
const CLASSIC_TEMPLATE: &str = include_str!("../templates/classic.txt");

/// The classic prompt only ever embeds this much of the article.
pub const CLASSIC_CONTENT_CHARS: usize = 3000;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(content|type_label|style|custom)\}").expect("Failed to compile placeholder pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Job,
    AdmitCard,
    Result,
    AnswerKey,
    Syllabus,
    Other,
}

impl ContentType {
    /// Unknown or missing keys map to [`ContentType::Other`].
    pub fn from_key(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            Some("job") => ContentType::Job,
            Some("admit_card") => ContentType::AdmitCard,
            Some("result") => ContentType::Result,
            Some("answer_key") => ContentType::AnswerKey,
            Some("syllabus") => ContentType::Syllabus,
            _ => ContentType::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentType::Job => "Latest Job / Recruitment Notification",
            ContentType::AdmitCard => "Admit Card Release",
            ContentType::Result => "Exam Result Declaration",
            ContentType::AnswerKey => "Answer Key Release",
            ContentType::Syllabus => "Exam Syllabus & Pattern",
            ContentType::Other => "Notification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Conversational,
    Professional,
    Youtube,
    Blog,
}

impl Style {
    /// Unknown or missing keys fall back to the default style.
    pub fn from_key(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            Some("professional") => Style::Professional,
            Some("youtube") => Style::Youtube,
            Some("blog") => Style::Blog,
            _ => Style::Conversational,
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Style::Conversational => {
                "Bilkul conversational tone mein likhein jaise koi dost bata raha ho. \"Doston\", \"Aap\", \"Suniye\" jaise words use karein. Friendly aur warm tone ho."
            }
            Style::Professional => {
                "Professional aur formal tone mein likhein, lekin boring na lage. Information clear aur structured ho."
            }
            Style::Youtube => {
                "Energetic YouTube style mein likhein - excitement ho, emojis zyada use karein, \"Guys\", \"Finally\", \"Leaked\" jaise words use karein. Thoda dramatic tone ho."
            }
            Style::Blog => {
                "Detailed blog post style mein likhein - comprehensive information ho, har point cover karein, informative aur helpful tone ho."
            }
        }
    }
}

/// Everything a template needs for one rewrite.
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    pub content: String,
    pub content_type: ContentType,
    pub style: Style,
    pub custom_prompt: Option<String>,
    pub custom_format: Option<String>,
}

impl RewriteRequest {
    pub fn new(content: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            content: content.into(),
            content_type,
            style: Style::default(),
            custom_prompt: None,
            custom_format: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptTemplate {
    /// Style-aware prompt with the full structure and language directives.
    #[default]
    Detailed,
    /// Short instruction list; embeds only the start of the article.
    Classic,
}

impl FromStr for PromptTemplate {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(PromptTemplate::Detailed),
            "classic" => Ok(PromptTemplate::Classic),
            other => Err(AppError::Config(format!("Unknown prompt template: {}", other))),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PromptTemplate {
    pub fn build(self, request: &RewriteRequest) -> String {
        match self {
            PromptTemplate::Detailed => {
                let mut custom = String::new();
                if let Some(instructions) = non_blank(&request.custom_prompt) {
                    custom.push_str("**CUSTOM INSTRUCTIONS:** ");
                    custom.push_str(instructions);
                    custom.push('\n');
                }
                if let Some(format) = non_blank(&request.custom_format) {
                    custom.push_str("**CUSTOM FORMAT:** ");
                    custom.push_str(format);
                    custom.push('\n');
                }
                render(
                    DETAILED_TEMPLATE,
                    &request.content,
                    request.content_type.label(),
                    request.style.instructions(),
                    &custom,
                )
            }
            PromptTemplate::Classic => {
                let content: String = request.content.chars().take(CLASSIC_CONTENT_CHARS).collect();
                let custom = non_blank(&request.custom_format)
                    .or_else(|| non_blank(&request.custom_prompt))
                    .map(|format| format!("7. Custom Format follow karein: {}\n", format))
                    .unwrap_or_default();
                render(
                    CLASSIC_TEMPLATE,
                    &content,
                    request.content_type.label(),
                    request.style.instructions(),
                    &custom,
                )
            }
        }
    }
}

// Single pass, so placeholder-like text inside the article is never expanded.
fn render(template: &str, content: &str, type_label: &str, style: &str, custom: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| match &caps[1] {
            "content" => content.to_string(),
            "type_label" => type_label.to_string(),
            "style" => style.to_string(),
            _ => custom.to_string(),
        })
        .into_owned()
}
