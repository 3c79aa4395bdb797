//! Keyword and tag extraction.
//!
//! Notes and queries are indexed by the same two derived features:
//! keywords (free vocabulary, at most ten) and tags (a fixed category set, at
//! most five). Extraction sits behind the [`Extractor`] trait so the memory
//! can run against a local heuristic or an LLM.
//!
//! The LLM path never surfaces provider failures: [`LlmExtractor`] falls back
//! to the heuristic whenever the backend errors or returns nothing usable.

use std::collections::HashMap;
use std::sync::Arc;

use amem_llm::{CompletionRequest, LlmBackend, Message};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Result;

/// Maximum keywords kept per note or query.
pub const MAX_KEYWORDS: usize = 10;

/// Maximum tags kept per note or query.
pub const MAX_TAGS: usize = 5;

/// Words shorter than this many characters (or equal) are never keywords.
const MIN_KEYWORD_CHARS: usize = 3;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "has", "have", "been", "were", "this", "that", "with", "they", "will", "would",
    "there", "their", "what", "about", "which", "when", "make", "like", "time", "just", "know",
    "take", "into", "your", "some", "could", "them", "than", "then", "also", "from", "very",
];

/// Category tag and the substrings that trigger it.
const TAG_TRIGGERS: &[(&str, &[&str])] = &[
    (
        "code",
        &["code", "function", "class", "implement", "program", "compile", "refactor", "rust", "python"],
    ),
    (
        "architecture",
        &["architecture", "design", "pattern", "structure", "component", "module", "system"],
    ),
    (
        "optimization",
        &["optimi", "performance", "cache", "caching", "speed", "latency", "faster", "efficien"],
    ),
    (
        "security",
        &["security", "auth", "password", "encrypt", "vulnerab", "permission", "credential"],
    ),
    (
        "learning",
        &["learn", "tutorial", "understand", "lesson", "studying", "practice"],
    ),
    ("tool", &["tool", "utility", "command", "script", "plugin", "library"]),
    ("bug", &["bug", "error", "crash", "broken", "exception", "regression"]),
    ("idea", &["idea", "maybe", "what if", "brainstorm", "proposal", "concept"]),
    ("research", &["research", "paper", "study", "analysis", "experiment", "investigat"]),
    ("web", &["http", "web", "url", "browser", "html", "website", "api"]),
];

// ─────────────────────────────────────────────────────────────────────────────
// Features
// ─────────────────────────────────────────────────────────────────────────────

/// Keywords and tags derived for a note or a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFeatures {
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
}

impl NoteFeatures {
    pub fn new(keywords: Vec<String>, tags: Vec<String>) -> Self {
        Self {
            keywords: normalize(keywords, MAX_KEYWORDS),
            tags: normalize(tags, MAX_TAGS),
        }
    }
}

/// Lower-case, trim, drop empties and duplicates (first wins), then cap.
fn normalize(items: Vec<String>, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len().min(cap));
    for item in items {
        let item = item.trim().to_lowercase();
        if item.is_empty() || out.contains(&item) {
            continue;
        }
        out.push(item);
        if out.len() == cap {
            break;
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Extractor Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Pluggable keyword/tag derivation.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract up to ten keywords from `text`.
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>>;

    /// Infer up to five category tags from a note's content and context.
    async fn infer_tags(&self, content: &str, context: &str) -> Result<Vec<String>>;

    /// Name of this extractor, for logs.
    fn name(&self) -> &str;
}

/// Shared, dynamically dispatched extractor.
pub type SharedExtractor = Arc<dyn Extractor>;

/// Run both extraction steps and normalize the result.
///
/// Keywords come from `content` alone; tags see `content` and `context`.
pub async fn extract_features(
    extractor: &dyn Extractor,
    content: &str,
    context: &str,
) -> Result<NoteFeatures> {
    let keywords = extractor.extract_keywords(content).await?;
    let tags = extractor.infer_tags(content, context).await?;
    Ok(NoteFeatures::new(keywords, tags))
}

// ─────────────────────────────────────────────────────────────────────────────
// Heuristic Extractor
// ─────────────────────────────────────────────────────────────────────────────

/// Stopword-filtered word frequency for keywords, trigger table for tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Keywords by frequency; ties keep first-occurrence order.
    pub fn keywords(text: &str) -> Vec<String> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() > MIN_KEYWORD_CHARS && !STOPWORDS.contains(&w.as_str()));

        for (position, word) in words.enumerate() {
            counts
                .entry(word)
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, position));
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(word, (count, first))| (word, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked
            .into_iter()
            .take(MAX_KEYWORDS)
            .map(|(word, _, _)| word)
            .collect()
    }

    /// Category tags whose triggers appear in `content + " " + context`.
    pub fn tags(content: &str, context: &str) -> Vec<String> {
        let haystack = format!("{} {}", content, context).to_lowercase();
        TAG_TRIGGERS
            .iter()
            .filter(|(_, triggers)| triggers.iter().any(|t| haystack.contains(t)))
            .map(|(tag, _)| (*tag).to_string())
            .take(MAX_TAGS)
            .collect()
    }
}

#[async_trait]
impl Extractor for HeuristicExtractor {
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>> {
        Ok(Self::keywords(text))
    }

    async fn infer_tags(&self, content: &str, context: &str) -> Result<Vec<String>> {
        Ok(Self::tags(content, context))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Extractor
// ─────────────────────────────────────────────────────────────────────────────

const KEYWORD_PROMPT: &str = "Extract 5-10 important keywords from the following text. \
Return one keyword per line with no numbering, bullets, or commentary.";

/// Keyword extraction through a completion backend, with heuristic fallback.
///
/// Tags are always inferred heuristically.
pub struct LlmExtractor {
    backend: Arc<dyn LlmBackend>,
    model: String,
    max_tokens: u32,
}

impl LlmExtractor {
    /// Create an extractor that asks `model` on `backend`.
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            max_tokens: 128,
        }
    }

    /// Build the keyword request for `text`.
    fn request(&self, text: &str) -> CompletionRequest {
        CompletionRequest::new(
            self.model.clone(),
            vec![Message::user(format!("Text:\n{}", text))],
            self.max_tokens,
        )
        .with_system(KEYWORD_PROMPT)
        .with_temperature(0.0)
    }
}

/// Strip one leading list marker (`-`, `*`, `•`, `1.`, `2)`) followed by whitespace.
///
/// Digit-led keywords such as `3d` or `401` are left alone.
fn strip_list_marker(line: &str) -> &str {
    let marker_len = if line.starts_with(['-', '*', '•']) {
        line.chars().next().map_or(0, char::len_utf8)
    } else {
        let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        match line[digits..].chars().next() {
            Some('.' | ')') if digits > 0 => digits + 1,
            _ => 0,
        }
    };
    if marker_len == 0 {
        return line;
    }
    let rest = &line[marker_len..];
    if rest.starts_with(char::is_whitespace) {
        rest
    } else {
        line
    }
}

/// Parse a one-keyword-per-line reply, stripping bullets and numbering.
pub fn parse_keyword_lines(reply: &str) -> Vec<String> {
    let lines = reply.lines().filter_map(|line| {
        let trimmed = strip_list_marker(line.trim())
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | ','))
            .trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    });
    normalize(lines.collect(), MAX_KEYWORDS)
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>> {
        match self.backend.complete(self.request(text)).await {
            Ok(response) => {
                let keywords = parse_keyword_lines(&response.text);
                if keywords.is_empty() {
                    warn!(
                        backend = self.backend.name(),
                        "LLM returned no keywords, using heuristic"
                    );
                    return Ok(HeuristicExtractor::keywords(text));
                }
                debug!(backend = self.backend.name(), count = keywords.len(), "LLM keywords");
                Ok(keywords)
            }
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "LLM keyword extraction failed, using heuristic"
                );
                Ok(HeuristicExtractor::keywords(text))
            }
        }
    }

    async fn infer_tags(&self, content: &str, context: &str) -> Result<Vec<String>> {
        Ok(HeuristicExtractor::tags(content, context))
    }

    fn name(&self) -> &str {
        "llm"
    }
}
