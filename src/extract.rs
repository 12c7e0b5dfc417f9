//! Best-effort HTML to plain text.
//!
//! This is a regex transform, not a parser: malformed markup, comments and
//! CDATA are handled only as far as the patterns below happen to cover them.

use once_cell::sync::Lazy;
use regex::Regex;

// Compile the patterns once; `extract_text` runs on every fetched page.
static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("Failed to compile script pattern")
});

static STYLE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("Failed to compile style pattern")
});

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").expect("Failed to compile tag pattern")
});

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(nbsp|amp|lt|gt|quot);").expect("Failed to compile entity pattern")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Failed to compile whitespace pattern")
});

/// Plain text cut to a character ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub text: String,
    pub truncated: bool,
}

impl ExtractedArticle {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Strips markup from `html` and returns whitespace-normalized text.
///
/// Script and style blocks go first so their bodies never surface as text.
/// Whitespace is collapsed before entities are decoded, so `&nbsp;` runs stay
/// as runs of spaces. Only `&nbsp;`, `&amp;`, `&lt;`, `&gt;` and `&quot;` are
/// decoded, in a single pass; every other entity is left verbatim.
pub fn extract_text(html: &str) -> String {
    let text = SCRIPT_BLOCK.replace_all(html, " ");
    let text = STYLE_BLOCK.replace_all(&text, " ");
    let text = TAG.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = ENTITY.replace_all(&text, |caps: &regex::Captures| {
        match &caps[1] {
            "nbsp" => " ",
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            _ => "\"",
        }
    });

    text.trim().to_string()
}

/// Cuts `text` to at most `max_chars` characters.
pub fn truncate_article(text: String, max_chars: usize) -> ExtractedArticle {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut text = text;
            text.truncate(byte_idx);
            ExtractedArticle { text, truncated: true }
        }
        None => ExtractedArticle { text, truncated: false },
    }
}
