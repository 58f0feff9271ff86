//! AI summarization and rewriting over an OpenRouter-compatible
//! chat-completions API.
//!
//! One blocking HTTPS round trip per attempt, no client-side timeout, no
//! automatic retry except the model fallback chain: a failed request moves
//! immediately to the next model identifier in priority order, and the
//! failure is surfaced only once the list is exhausted.
//!
//! Model output is post-processed with a fixed set of cleanup rules before
//! it reaches the repository: meta-commentary prefixes, code fences, and
//! separator lines are stripped, and summaries get light re-formatting for
//! display.

use crate::{AinotesError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Chat-completions endpoint all requests go to.
pub const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Environment variable consulted by [`AiConfig::from_env`].
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Model identifiers tried in sequence, best to least preferred.
pub const DEFAULT_MODELS: [&str; 3] = [
    "openai/gpt-4o-mini",
    "openai/gpt-3.5-turbo",
    "google/gemini-flash-1.5",
];

const APP_TITLE: &str = "AI Notes";

const SUMMARIZE_SYSTEM_PROMPT: &str = "\
You are a precise summarization system. Your job is to reduce text while keeping meaning. \
Never invent facts, and never add details not present in the source.

STRUCTURE RULE:
- If the input text is primarily bullets, numbered lists, or clearly itemized points, summarize using bullets.
- If the input text is written in normal sentences/paragraphs, summarize in paragraph form (no bullet list).
- Only use separators when truly needed. Do not add separators for single-section summaries.

Core Summarization Rules:
1) Identify the main theme and key ideas.
2) Remove examples, anecdotes, and redundant details.
3) Rewrite the core ideas in short, simple sentences.
4) Do not copy long sentences verbatim.
5) Aim to reduce text by 50-80%.
6) Maintain a neutral, factual tone.

Formatting Policy:
- If there is a clear title, place it as a single line (10 words or fewer) at the top.
- If the summary is bullet-based, use \"- \" for bullets and minimal sub-bullets.
- Use **bold** sparingly for important entities or concepts.
- Use a horizontal separator line \"---\" ONLY when summarizing multiple sections.
- If the input is already a list, compress and de-duplicate it rather than repeating verbatim.";

const REWRITE_SYSTEM_PROMPT: &str = "\
You are a professional text rewriting assistant. Your job is to rewrite text according to user \
instructions while preserving the core meaning and facts.

Core Rules:
1) Follow the user's instruction precisely.
2) Maintain all factual information and key details.
3) Do not add information that wasn't in the original text unless explicitly asked.
4) Preserve the overall structure and organization when possible.
5) Ensure the rewritten text is clear, coherent, and well-formatted.
6) If the instruction asks for formatting changes (like bullet points), apply them appropriately.
7) Maintain the same level of detail unless the instruction asks to expand or reduce it.
8) Do not add separator lines, horizontal rules, or decorative elements like \"---\" to the output.
9) Do NOT add any introductory phrases, conversational text, or meta-commentary.
10) Do NOT add any labels, headers, or explanatory text before or after the rewritten content.
11) Output ONLY the rewritten text directly - start with the actual content.
12) The output should be the rewritten text itself, not a description or introduction to it.";

/// Configuration for [`AiService`]: the bearer credential and the model
/// priority list.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    /// Model identifiers tried in order on failure.
    pub models: Vec<String>,
}

impl AiConfig {
    /// Config with the default model fallback chain.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            models: DEFAULT_MODELS.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    /// Reads the API key from the [`API_KEY_ENV`] environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::MissingApiKey`] when the variable is unset
    /// or empty.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(AinotesError::MissingApiKey),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Client for AI-assisted summarize and rewrite.
pub struct AiService {
    client: reqwest::blocking::Client,
    config: AiConfig,
}

impl AiService {
    /// Builds the service. The HTTP client is configured without a request
    /// timeout; a hung network call stays pending until the transport gives
    /// up.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::Http`] if the client cannot be constructed.
    pub fn new(config: AiConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(None).build()?;
        Ok(Self { client, config })
    }

    /// Summarizes `content`, reducing it by roughly 50-80%.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::AiRequest`] for empty content,
    /// [`AinotesError::MissingApiKey`] when no key is configured, or
    /// [`AinotesError::AiUnavailable`] after the fallback chain is
    /// exhausted.
    pub fn summarize(&self, content: &str) -> Result<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AinotesError::AiRequest("Note content is empty".to_string()));
        }

        let words = word_count(content);
        let user_prompt = format!(
            "Summarize the text below. Reduce by 50-80% while keeping the core meaning.\n\
             Identify the main theme, remove side details, avoid long sentence copying.\n\n\
             Formatting Instructions:\n\
             - If the original text is a list (bullets/numbers), output the summary as a bullet list.\n\
             - If the original text is in paragraph form, output the summary in paragraph form (no bullets).\n\
             - Optional short title (10 words or fewer) if appropriate.\n\
             - Use **bold** sparingly.\n\
             - Only use a separator line \"---\" if summarizing more than one distinct section.\n\
             - Do not include meta commentary or labels like \"Summary:\".\n\n\
             Original Text ({words} words):\n---\n{content}\n---"
        );

        let raw = self.chat(
            SUMMARIZE_SYSTEM_PROMPT,
            &user_prompt,
            summary_max_tokens(words),
            0.2,
            0.8,
        )?;
        Ok(format_summary(&clean_summary(&raw)))
    }

    /// Rewrites `content` per `instruction`, preserving facts and detail.
    ///
    /// # Errors
    ///
    /// Returns [`AinotesError::AiRequest`] for empty content or a missing
    /// instruction, plus the same failure modes as [`Self::summarize`].
    pub fn rewrite(&self, content: &str, instruction: &str) -> Result<String> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AinotesError::AiRequest("Note content is empty".to_string()));
        }
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(AinotesError::AiRequest(
                "Rewrite instruction is required".to_string(),
            ));
        }

        let user_prompt = format!(
            "Rewrite the following text according to this instruction: \"{instruction}\"\n\n\
             Preserve all factual information and key points. Only change what is necessary to \
             fulfill the instruction.\n\n\
             CRITICAL: Output ONLY the rewritten text directly. Do NOT add introductory phrases, \
             conversational text, meta-commentary, labels, headers, or separator lines.\n\n\
             Original Text:\n{content}\n\n\
             Provide the rewritten text now (start directly with the content):"
        );

        let raw = self.chat(
            REWRITE_SYSTEM_PROMPT,
            &user_prompt,
            rewrite_max_tokens(word_count(content)),
            0.7,
            0.9,
        )?;
        Ok(clean_rewrite(&raw))
    }

    /// One pass over the model fallback chain. Each failed attempt moves
    /// straight to the next model; the last failure message is what gets
    /// surfaced.
    fn chat(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
        top_p: f32,
    ) -> Result<String> {
        if self.config.api_key.trim().is_empty() {
            return Err(AinotesError::MissingApiKey);
        }

        let mut last_error = "No models configured".to_string();
        for model in &self.config.models {
            let request = ChatRequest {
                model,
                messages: [
                    ChatMessage { role: "system", content: system },
                    ChatMessage { role: "user", content: user },
                ],
                max_tokens,
                temperature,
                top_p,
            };

            let response = match self
                .client
                .post(OPENROUTER_CHAT_URL)
                .bearer_auth(&self.config.api_key)
                .header("X-Title", APP_TITLE)
                .json(&request)
                .send()
            {
                Ok(response) => response,
                Err(e) => {
                    log::warn!("model {model} request failed: {e}");
                    last_error = e.to_string();
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                last_error = response
                    .json::<ApiErrorBody>()
                    .ok()
                    .and_then(|body| body.error)
                    .and_then(|error| error.message)
                    .unwrap_or_else(|| format!("Request failed with status {status}"));
                log::warn!("model {model} returned an error: {last_error}");
                continue;
            }

            let body: ChatResponse = match response.json() {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("model {model} returned an unreadable body: {e}");
                    last_error = e.to_string();
                    continue;
                }
            };

            let text = body
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_deref())
                .map(str::trim)
                .unwrap_or_default();
            if text.is_empty() {
                last_error = "Empty response from AI model".to_string();
                continue;
            }
            return Ok(text.to_string());
        }

        Err(AinotesError::AiUnavailable(last_error))
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Summary budget: 20-50% of the input, floored at 100 and capped at 400
/// tokens.
pub(crate) fn summary_max_tokens(words: usize) -> u32 {
    (((words as f64) * 0.35).floor() as u32).clamp(100, 400)
}

/// Rewrite budget: allows expansion or reduction, floored at 200 and capped
/// at 2000 tokens.
pub(crate) fn rewrite_max_tokens(words: usize) -> u32 {
    (((words as f64) * 1.5).floor() as u32).clamp(200, 2000)
}

static SUMMARY_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(Summary:|Here's a summary:|Here is a summary:|Here's the summary:)\s*")
        .expect("valid summary label regex")
});
static SUMMARY_PREAMBLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(The following|This|The) (is a|note|summary) (of|about|regarding):\s*")
        .expect("valid summary preamble regex")
});
static NUMBERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.\s+").expect("valid numbered item regex"));
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|\n)[-•▪▫]\s+").expect("valid bullet regex"));
static EXCESS_NEWLINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid newline collapse regex"));
static SENTENCE_GAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([A-Z])").expect("valid sentence gap regex"));
static COLON_GAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z])").expect("valid colon gap regex"));

static REWRITE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(Here's the rewritten text:|Here is the rewritten text:|Rewritten text:|Rewritten:)\s*",
    )
    .expect("valid rewrite label regex")
});
static OPEN_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^```[a-z]*\n?").expect("valid open fence regex"));
static CLOSE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n?```$").expect("valid close fence regex"));
static EXCLAMATION_STARTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(Certainly!|Sure!|Of course!|Absolutely!|Great!|Perfect!)\s*")
        .expect("valid exclamation starter regex")
});
static HERE_ARE_INTRO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(Here are|Here is|Here's)\s+(some|a few|several|the)?\s*(recommendations|suggestions|tips|ideas|points|ways|things|guidelines|strategies|methods|approaches)\s*(for|to|on|about|regarding)?\s*[^:\n]*:?\s*",
    )
    .expect("valid here-are intro regex")
});
static HELPER_INTRO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(I'll help you|I can help|Let me help|I've rewritten|I have rewritten|I rewrote|I'll rewrite|I can rewrite)\s+",
    )
    .expect("valid helper intro regex")
});
static STARTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(I'll|I will|Let me|I can|I've|I have)\s+").expect("valid starter regex")
});
static INTRO_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(Certainly!|Sure!|Of course!|Absolutely!|Great!|Perfect!|Here are|Here is|Here's|I'll|I will|Let me|I can|I've|I have)\s+",
    )
    .expect("valid intro line regex")
});
static SEPARATOR_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[-=_]{3,}\s*$").expect("valid separator line regex"));
static LEADING_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[-=_]{3,}\s*").expect("valid leading separator regex"));
static TRAILING_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\s*[-=_]{3,}$").expect("valid trailing separator regex"));

/// Strips "Summary:"-style labels and preambles from a model summary.
pub(crate) fn clean_summary(text: &str) -> String {
    let text = SUMMARY_LABEL_RE.replace(text.trim(), "");
    let text = SUMMARY_PREAMBLE_RE.replace(text.trim(), "");
    text.trim().to_string()
}

/// Light re-formatting of a summary for display: list items on their own
/// lines, normalized bullets, collapsed blank runs, and breathing room
/// after sentence stops and colons.
pub(crate) fn format_summary(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = NUMBERED_ITEM_RE.replace_all(text, "\n${1}. ");
    let text = BULLET_RE.replace_all(&text, "\n• ");
    let text = EXCESS_NEWLINES_RE.replace_all(&text, "\n\n");
    let text = SENTENCE_GAP_RE.replace_all(text.trim(), ". ${1}");
    let text = COLON_GAP_RE.replace_all(&text, ": ${1}");
    text.trim().to_string()
}

/// Strips wrapper text from a model rewrite: labels, code fences,
/// conversational starters, introductory lines, and separator rules.
pub(crate) fn clean_rewrite(text: &str) -> String {
    let text = REWRITE_LABEL_RE.replace(text.trim(), "");
    let text = OPEN_FENCE_RE.replace(text.trim(), "");
    let text = CLOSE_FENCE_RE.replace(text.trim(), "");
    let text = EXCLAMATION_STARTER_RE.replace(text.trim(), "");
    let text = HERE_ARE_INTRO_RE.replace(&text, "");
    let text = HELPER_INTRO_RE.replace(&text, "");
    let text = STARTER_RE.replace(&text, "");

    // Drop lines that are purely introductions: they match a starter
    // pattern and either end with a colon or are very short.
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return false;
            }
            if INTRO_LINE_RE.is_match(trimmed) {
                let is_short = trimmed.split_whitespace().count() <= 8;
                if trimmed.ends_with(':') || is_short {
                    return false;
                }
            }
            true
        })
        .collect();
    let text = kept.join("\n");

    let text = SEPARATOR_LINE_RE.replace_all(&text, "");
    let text = LEADING_SEPARATOR_RE.replace_all(&text, "");
    let text = TRAILING_SEPARATOR_RE.replace_all(&text, "");
    let text = EXCESS_NEWLINES_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_token_budget_bounds() {
        assert_eq!(summary_max_tokens(10), 100);
        assert_eq!(summary_max_tokens(1000), 350);
        assert_eq!(summary_max_tokens(100_000), 400);
    }

    #[test]
    fn test_rewrite_token_budget_bounds() {
        assert_eq!(rewrite_max_tokens(10), 200);
        assert_eq!(rewrite_max_tokens(1000), 1500);
        assert_eq!(rewrite_max_tokens(100_000), 2000);
    }

    #[test]
    fn test_clean_summary_strips_labels() {
        assert_eq!(clean_summary("Summary: the gist"), "the gist");
        assert_eq!(clean_summary("Here's a summary: the gist"), "the gist");
        assert_eq!(clean_summary("This summary of: the gist"), "the gist");
        assert_eq!(clean_summary("plain text stays"), "plain text stays");
    }

    #[test]
    fn test_format_summary_normalizes_bullets() {
        let formatted = format_summary("- first point\n▪ second point");
        assert!(formatted.contains("• first point"));
        assert!(formatted.contains("• second point"));
    }

    #[test]
    fn test_format_summary_spacing_fixes() {
        let formatted = format_summary("One sentence.Another starts.Key:value");
        assert!(formatted.contains("sentence. Another"));
        assert!(formatted.contains("Key: value"));
    }

    #[test]
    fn test_format_summary_collapses_blank_runs() {
        let formatted = format_summary("a\n\n\n\n\nb");
        assert_eq!(formatted, "a\n\nb");
    }

    #[test]
    fn test_clean_rewrite_strips_label_and_fences() {
        let cleaned = clean_rewrite("Here's the rewritten text:\n```markdown\nthe body\n```");
        assert_eq!(cleaned, "the body");
    }

    #[test]
    fn test_clean_rewrite_strips_conversational_openers() {
        let cleaned = clean_rewrite("Certainly! Here are some tips for note-taking:\n- keep it short\n- tag things");
        assert!(!cleaned.contains("Certainly"));
        assert!(!cleaned.to_lowercase().contains("here are"));
        assert!(cleaned.contains("keep it short"));
    }

    #[test]
    fn test_clean_rewrite_drops_mid_text_intro_lines() {
        let cleaned = clean_rewrite(
            "First paragraph of content.\nSure! Here's the result:\nSecond paragraph.",
        );
        assert_eq!(cleaned, "First paragraph of content.\nSecond paragraph.");
    }

    #[test]
    fn test_clean_rewrite_removes_separator_lines() {
        let cleaned = clean_rewrite("first part\n---\nsecond part\n===");
        assert!(!cleaned.contains("---"));
        assert!(!cleaned.contains("==="));
        assert!(cleaned.contains("first part"));
        assert!(cleaned.contains("second part"));
    }

    #[test]
    fn test_summarize_rejects_empty_content() {
        let service = AiService::new(AiConfig::new("test-key")).unwrap();
        let err = service.summarize("   ").unwrap_err();
        assert!(matches!(err, AinotesError::AiRequest(_)));
    }

    #[test]
    fn test_rewrite_requires_instruction() {
        let service = AiService::new(AiConfig::new("test-key")).unwrap();
        let err = service.rewrite("some content", "").unwrap_err();
        assert!(matches!(err, AinotesError::AiRequest(_)));
    }

    #[test]
    fn test_missing_api_key_fails_before_any_request() {
        let service = AiService::new(AiConfig::new("")).unwrap();
        let err = service.summarize("some content").unwrap_err();
        assert!(matches!(err, AinotesError::MissingApiKey));
    }

    #[test]
    fn test_empty_model_list_is_unavailable() {
        let mut config = AiConfig::new("test-key");
        config.models.clear();
        let service = AiService::new(config).unwrap();
        let err = service.summarize("some content").unwrap_err();
        assert!(matches!(err, AinotesError::AiUnavailable(_)));
    }

    #[test]
    fn test_default_model_chain_order() {
        let config = AiConfig::new("k");
        assert_eq!(config.models[0], "openai/gpt-4o-mini");
        assert_eq!(config.models.len(), 3);
    }
}
