use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::{Error, Operation, Result};

/// Language codes accepted by the translate operation.
pub const SUPPORTED_LANGUAGES: [&str; 10] = ["en", "ar", "fr", "de", "es", "zh", "ja", "ko", "ru", "pt"];

pub const MAX_REQUEST_ID_CHARS: usize = 64;
pub const MIN_SUMMARIZE_CHARS: usize = 50;
pub const MAX_SENTENCES: u32 = 20;
pub const MIN_CATEGORIES: usize = 2;
pub const MAX_CATEGORIES: usize = 20;

static LANGUAGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}$").expect("language code pattern is valid"));

/// Fields every operation request carries.
///
/// The orchestrator only needs the payload text and the caller's correlation
/// id; everything else is operation-specific and handled by the renderers.
pub trait OperationRequest {
    const OPERATION: Operation;

    fn text(&self) -> &str;

    fn request_id(&self) -> Option<&str>;

    /// Trim and check caller-controlled fields. Hard caps are not checked here.
    fn normalize(self) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummarizeRequest {
    pub text: String,
    #[serde(default = "default_max_sentences")]
    pub max_sentences: u32,
    /// ISO 639-1 code of the source text; the summary is written in it.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyRequest {
    pub text: String,
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Management payload for changing an operation's daily limit (0 = unlimited).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateLimitRequest {
    pub operation: Operation,
    pub daily_limit: u64,
}

fn default_max_sentences() -> u32 {
    5
}

fn default_language() -> String {
    "en".to_string()
}

impl SummarizeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_sentences: default_max_sentences(),
            language: default_language(),
            request_id: None,
        }
    }
}

impl TranslateRequest {
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            request_id: None,
        }
    }
}

impl ClassifyRequest {
    pub fn new<S: Into<String>>(text: impl Into<String>, categories: impl IntoIterator<Item = S>) -> Self {
        Self {
            text: text.into(),
            categories: categories.into_iter().map(Into::into).collect(),
            request_id: None,
        }
    }
}

impl OperationRequest for SummarizeRequest {
    const OPERATION: Operation = Operation::Summarize;

    fn text(&self) -> &str {
        &self.text
    }

    fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    fn normalize(mut self) -> Result<Self> {
        check_request_id(self.request_id.as_deref())?;
        self.text = normalize_text(self.text)?;

        let chars = self.text.chars().count();
        if chars < MIN_SUMMARIZE_CHARS {
            return Err(Error::InvalidInput(format!(
                "text must be at least {} characters, got {}",
                MIN_SUMMARIZE_CHARS, chars
            )));
        }
        if !(1..=MAX_SENTENCES).contains(&self.max_sentences) {
            return Err(Error::InvalidInput(format!(
                "max_sentences must be between 1 and {}, got {}",
                MAX_SENTENCES, self.max_sentences
            )));
        }
        if !LANGUAGE_CODE.is_match(&self.language) {
            return Err(Error::InvalidInput(format!(
                "language must be a two-letter lowercase ISO 639-1 code, got '{}'",
                self.language
            )));
        }

        Ok(self)
    }
}

impl OperationRequest for TranslateRequest {
    const OPERATION: Operation = Operation::Translate;

    fn text(&self) -> &str {
        &self.text
    }

    fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    fn normalize(mut self) -> Result<Self> {
        check_request_id(self.request_id.as_deref())?;
        self.text = normalize_text(self.text)?;

        for code in [&self.source_language, &self.target_language] {
            if !SUPPORTED_LANGUAGES.contains(&code.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "language '{}' is not supported (supported: {})",
                    code,
                    SUPPORTED_LANGUAGES.join(", ")
                )));
            }
        }
        if self.source_language == self.target_language {
            return Err(Error::InvalidInput(
                "source_language and target_language must differ".to_string(),
            ));
        }

        Ok(self)
    }
}

impl OperationRequest for ClassifyRequest {
    const OPERATION: Operation = Operation::Classify;

    fn text(&self) -> &str {
        &self.text
    }

    fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    fn normalize(mut self) -> Result<Self> {
        check_request_id(self.request_id.as_deref())?;
        self.text = normalize_text(self.text)?;

        let cleaned: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        if cleaned.len() < MIN_CATEGORIES {
            return Err(Error::InvalidInput(format!(
                "at least {} non-empty category labels are required",
                MIN_CATEGORIES
            )));
        }
        if cleaned.len() > MAX_CATEGORIES {
            return Err(Error::InvalidInput(format!(
                "at most {} category labels are allowed, got {}",
                MAX_CATEGORIES,
                cleaned.len()
            )));
        }

        let mut seen = HashSet::new();
        for label in &cleaned {
            if !seen.insert(label.to_lowercase()) {
                return Err(Error::InvalidInput(format!(
                    "category labels must be unique (case-insensitive), '{}' is repeated",
                    label
                )));
            }
        }

        self.categories = cleaned;
        Ok(self)
    }
}

fn normalize_text(text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "text must not be empty or whitespace only".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn check_request_id(request_id: Option<&str>) -> Result<()> {
    if let Some(id) = request_id
        && id.chars().count() > MAX_REQUEST_ID_CHARS
    {
        return Err(Error::InvalidInput(format!(
            "request_id must be at most {} characters",
            MAX_REQUEST_ID_CHARS
        )));
    }
    Ok(())
}
