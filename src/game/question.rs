//! Canonical Question Shape
//!
//! Every question source is normalized into [`Question`] before the engine
//! sees it. Text and options are keyed by [`Language`]; BTreeMap keeps
//! serialization and iteration order stable.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

// =============================================================================
// DIFFICULTY
// =============================================================================

/// Question difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Difficulty {
    /// 0.8x points
    Easy,
    /// 1.0x points
    #[default]
    Medium,
    /// 1.5x points
    Hard,
    /// 2.0x points
    Expert,
}

impl Difficulty {
    /// Score multiplier in percent (integer so scoring stays exact).
    #[inline]
    pub fn multiplier_percent(self) -> u32 {
        match self {
            Difficulty::Easy => 80,
            Difficulty::Medium => 100,
            Difficulty::Hard => 150,
            Difficulty::Expert => 200,
        }
    }

    /// Parse a source label. Unknown labels fall back to medium.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            "expert" => Difficulty::Expert,
            _ => Difficulty::Medium,
        }
    }
}

// =============================================================================
// LANGUAGE
// =============================================================================

/// Display language of question text and options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// English
    En,
    /// Arabic
    Ar,
}

impl Language {
    /// All supported languages, primary first.
    pub const ALL: [Language; 2] = [Language::En, Language::Ar];

    /// Suffix used by raw sources (`question_en`, `options_ar`, ...).
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

// =============================================================================
// QUESTION
// =============================================================================

/// Why a question failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    /// No language has question text.
    #[error("question has no text")]
    MissingText,

    /// No language has options.
    #[error("question has no options")]
    MissingOptions,

    /// Languages disagree on how many options there are.
    #[error("option lists differ in length across languages")]
    OptionCountMismatch,

    /// Correct index points past the option list.
    #[error("correct option index {index} out of range for {len} options")]
    CorrectIndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Option count.
        len: usize,
    },
}

/// A single quiz question in canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, unique within a session
    pub id: String,

    /// Question text per language
    pub text: BTreeMap<Language, String>,

    /// Ordered options per language
    pub options: BTreeMap<Language, Vec<String>>,

    /// 0-based index of the correct option
    pub correct_option_index: usize,

    /// Free-form category label
    pub category: String,

    /// Difficulty tier
    pub difficulty: Difficulty,
}

impl Question {
    /// Create an English-only question.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_option_index: usize,
        difficulty: Difficulty,
    ) -> Self {
        let mut text_map = BTreeMap::new();
        text_map.insert(Language::En, text.into());
        let mut option_map = BTreeMap::new();
        option_map.insert(Language::En, options);

        Self {
            id: id.into(),
            text: text_map,
            options: option_map,
            correct_option_index,
            category: String::from("general"),
            difficulty,
        }
    }

    /// Set the category (builder style).
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Add a translation (builder style).
    pub fn with_translation(mut self, language: Language, text: impl Into<String>, options: Vec<String>) -> Self {
        self.text.insert(language, text.into());
        self.options.insert(language, options);
        self
    }

    /// Single-option stand-in used when the engine meets a missing or
    /// malformed question. Answering it is always correct.
    pub fn fallback(id: impl Into<String>) -> Self {
        let mut question = Self::new(
            id,
            "Get ready for the next question!",
            vec![String::from("Continue")],
            0,
            Difficulty::Easy,
        )
        .with_category("fallback");
        question.text.insert(Language::Ar, String::from("استعد للسؤال التالي!"));
        question.options.insert(Language::Ar, vec![String::from("متابعة")]);
        question
    }

    /// Number of options (shortest language list).
    pub fn option_count(&self) -> usize {
        self.options.values().map(Vec::len).min().unwrap_or(0)
    }

    /// Text in the requested language, falling back to any available.
    pub fn text_in(&self, language: Language) -> Option<&str> {
        self.text
            .get(&language)
            .or_else(|| self.text.values().next())
            .map(String::as_str)
    }

    /// Options in the requested language, falling back to any available.
    pub fn options_in(&self, language: Language) -> &[String] {
        self.options
            .get(&language)
            .or_else(|| self.options.values().next())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Is `index` the correct option?
    #[inline]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_option_index
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.text.values().all(|t| t.trim().is_empty()) {
            return Err(QuestionError::MissingText);
        }
        let mut lens = self.options.values().map(Vec::len);
        let first = match lens.next() {
            Some(len) if len > 0 => len,
            _ => return Err(QuestionError::MissingOptions),
        };
        if lens.any(|len| len != first) {
            return Err(QuestionError::OptionCountMismatch);
        }
        if self.correct_option_index >= first {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_option_index,
                len: first,
            });
        }
        Ok(())
    }

    /// Shorthand for `validate().is_ok()`.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
