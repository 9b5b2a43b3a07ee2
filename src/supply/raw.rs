//! Raw Question Normalization
//!
//! Question banks hand back loosely shaped JSON. Everything is mapped to
//! the canonical [`Question`] here, repairing what can be repaired and
//! rejecting the rest. Accepted variants:
//!
//! - text as `question`/`text` (string or `{en, ar}` object) or `question_en`/`question_ar`
//! - options as `options_en`/`options_ar` arrays
//! - options as an array, or as a JSON string holding an array
//! - options as objects carrying `text` and an `is_correct` flag
//! - correct index as `correct_option_index`, or `correct_answer` as option
//!   text (falling back to an index when no option matches)
//!
//! Empty options are dropped. An explicit or flagged correct position is
//! read against the source list and then shifted past the dropped entries;
//! a question whose correct option was itself empty is rejected.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::game::question::{Difficulty, Language, Question, QuestionError};

/// Fewest options a playable question may have.
pub const MIN_OPTIONS: usize = 2;

/// Why a raw question was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Top-level value is not an object.
    #[error("raw question is not a JSON object")]
    NotAnObject,

    /// No language has non-empty question text.
    #[error("raw question has no usable text")]
    MissingText,

    /// Not enough options to play.
    #[error("raw question has {0} options, need at least 2")]
    TooFewOptions(usize),

    /// The option marked correct has no text.
    #[error("correct option at source position {0} is empty")]
    EmptyCorrectOption(usize),

    /// Normalized shape still failed validation.
    #[error(transparent)]
    Invalid(#[from] QuestionError),
}

/// Outcome of normalizing a whole fetch.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    /// Playable questions, in source order
    pub questions: Vec<Question>,
    /// How many raw entries were dropped
    pub rejected: usize,
}

#[derive(Debug, Default)]
struct RawOption {
    text: BTreeMap<Language, String>,
    correct: bool,
}

/// Where one language's cleaned options came from in the source list.
#[derive(Debug, Clone, Default)]
struct OptionSource {
    /// Source positions of the options that survived, in order
    kept: Vec<usize>,
    raw_len: usize,
    flagged: Option<usize>,
}

impl OptionSource {
    fn from_parsed(parsed: &[RawOption]) -> Self {
        Self {
            kept: parsed
                .iter()
                .enumerate()
                .filter(|(_, o)| !o.text.is_empty())
                .map(|(i, _)| i)
                .collect(),
            raw_len: parsed.len(),
            flagged: parsed.iter().position(|o| o.correct),
        }
    }

    /// Cleaned index of a source position. `Ok(None)` when the position is
    /// outside the source list.
    fn remap(&self, position: usize) -> Result<Option<usize>, NormalizeError> {
        if position >= self.raw_len {
            return Ok(None);
        }
        self.kept
            .iter()
            .position(|&p| p == position)
            .map(Some)
            .ok_or(NormalizeError::EmptyCorrectOption(position))
    }
}

/// Normalize one raw question. `fallback_id` is used when the source
/// carries no id.
pub fn normalize(raw: &Value, fallback_id: &str) -> Result<Question, NormalizeError> {
    let obj = raw.as_object().ok_or(NormalizeError::NotAnObject)?;

    let text = read_text(obj);
    if text.is_empty() {
        return Err(NormalizeError::MissingText);
    }

    let (options, sources) = read_options(obj);
    let primary = primary_language(&options);
    let len = primary.and_then(|lang| options.get(&lang)).map_or(0, Vec::len);
    let source = match primary.and_then(|lang| sources.get(&lang)) {
        Some(source) if len >= MIN_OPTIONS => source,
        _ => return Err(NormalizeError::TooFewOptions(len)),
    };

    let correct_option_index = match read_correct_index(obj, &options, source)? {
        Some(index) => index,
        None => read_flagged(source, &sources)?.unwrap_or(0),
    };

    let question = Question {
        id: read_id(obj).unwrap_or_else(|| fallback_id.to_string()),
        text,
        options,
        correct_option_index,
        category: non_empty_str(obj.get("category")).unwrap_or_else(|| String::from("general")),
        difficulty: obj
            .get("difficulty")
            .and_then(Value::as_str)
            .map(Difficulty::parse_lenient)
            .unwrap_or_default(),
    };
    question.validate()?;
    Ok(question)
}

/// Normalize a fetch, logging and counting rejects.
pub fn normalize_all(raws: &[Value]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (i, raw) in raws.iter().enumerate() {
        match normalize(raw, &format!("raw-{i}")) {
            Ok(question) => batch.questions.push(question),
            Err(e) => {
                warn!("Rejected raw question #{}: {}", i, e);
                batch.rejected += 1;
            }
        }
    }
    batch
}

// =============================================================================
// FIELD READERS
// =============================================================================

fn read_id(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn read_text(obj: &Map<String, Value>) -> BTreeMap<Language, String> {
    let mut text = BTreeMap::new();
    for lang in Language::ALL {
        if let Some(s) = non_empty_str(obj.get(&format!("question_{}", lang.code()))) {
            text.insert(lang, s);
        }
    }
    for key in ["question", "text"] {
        if let Some(value) = obj.get(key) {
            for (lang, s) in localized(value, Language::En) {
                text.entry(lang).or_insert(s);
            }
        }
    }
    text
}

fn read_options(
    obj: &Map<String, Value>,
) -> (BTreeMap<Language, Vec<String>>, BTreeMap<Language, OptionSource>) {
    let mut options = BTreeMap::new();
    let mut sources = BTreeMap::new();

    for lang in Language::ALL {
        if let Some(items) = obj.get(&format!("options_{}", lang.code())).and_then(option_items) {
            let parsed = parse_items(&items, lang);
            options.insert(lang, column(&parsed, lang));
            sources.insert(lang, OptionSource::from_parsed(&parsed));
        }
    }

    for key in ["options", "choices"] {
        if let Some(items) = obj.get(key).and_then(option_items) {
            let parsed = parse_items(&items, Language::En);
            let source = OptionSource::from_parsed(&parsed);
            for lang in Language::ALL {
                if !options.contains_key(&lang) && parsed.iter().any(|o| o.text.contains_key(&lang)) {
                    options.insert(lang, column(&parsed, lang));
                    sources.insert(lang, source.clone());
                }
            }
        }
    }

    align(&mut options);
    sources.retain(|lang, _| options.contains_key(lang));
    (options, sources)
}

/// Explicit correct option, if the source names one that exists.
///
/// `correct_option_index` is always a position. `correct_answer` is matched
/// against the option texts first, so numeric answers like `"10"` pick the
/// option reading "10" rather than position 10.
fn read_correct_index(
    obj: &Map<String, Value>,
    options: &BTreeMap<Language, Vec<String>>,
    source: &OptionSource,
) -> Result<Option<usize>, NormalizeError> {
    for key in ["correct_option_index", "correct_answer"] {
        let Some(value) = obj.get(key) else {
            continue;
        };
        let literal = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };

        if key == "correct_answer" {
            if let Some(index) = position_of_text(options, &literal) {
                return Ok(Some(index));
            }
        }
        let position = literal.parse::<u64>().ok().and_then(|i| usize::try_from(i).ok());
        if let Some(index) = position.map(|p| source.remap(p)).transpose()?.flatten() {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// First option flagged `is_correct`, preferring the primary list.
fn read_flagged(
    primary: &OptionSource,
    sources: &BTreeMap<Language, OptionSource>,
) -> Result<Option<usize>, NormalizeError> {
    let flagged = std::iter::once(primary)
        .chain(sources.values())
        .find_map(|source| source.flagged.map(|p| (source, p)));
    match flagged {
        Some((source, position)) => source.remap(position),
        None => Ok(None),
    }
}

fn position_of_text(options: &BTreeMap<Language, Vec<String>>, text: &str) -> Option<usize> {
    options
        .values()
        .find_map(|opts| opts.iter().position(|o| o.trim() == text))
}

// =============================================================================
// HELPERS
// =============================================================================

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Text keyed by language from a string, number or `{en, ar}` object.
fn localized(value: &Value, default: Language) -> BTreeMap<Language, String> {
    let mut out = BTreeMap::new();
    match value {
        Value::String(s) if !s.trim().is_empty() => {
            out.insert(default, s.trim().to_string());
        }
        Value::Number(n) => {
            out.insert(default, n.to_string());
        }
        Value::Object(fields) => {
            for lang in Language::ALL {
                if let Some(s) = non_empty_str(fields.get(lang.code())) {
                    out.insert(lang, s);
                }
            }
        }
        _ => {}
    }
    out
}

/// Option list from an array or a JSON-encoded array string.
fn option_items(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Every source item in order, empty ones included so positions line up.
fn parse_items(items: &[Value], lang: Language) -> Vec<RawOption> {
    items
        .iter()
        .map(|item| {
            let option = match item {
                Value::Object(fields) => RawOption {
                    text: match fields.get("text").or_else(|| fields.get("option")) {
                        Some(text) => localized(text, lang),
                        None => localized(item, lang),
                    },
                    correct: fields
                        .get("is_correct")
                        .or_else(|| fields.get("correct"))
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                },
                other => RawOption { text: localized(other, lang), correct: false },
            };
            if option.text.is_empty() {
                debug!("Dropping empty option {}", item);
            }
            option
        })
        .collect()
}

/// One language's option texts, borrowing from another language where an
/// option lacks a translation.
fn column(parsed: &[RawOption], lang: Language) -> Vec<String> {
    parsed
        .iter()
        .filter_map(|o| o.text.get(&lang).or_else(|| o.text.values().next()).cloned())
        .collect()
}

/// English when present, else the first language with options.
fn primary_language(options: &BTreeMap<Language, Vec<String>>) -> Option<Language> {
    if options.contains_key(&Language::En) {
        Some(Language::En)
    } else {
        options.keys().next().copied()
    }
}

/// Drop languages whose option count disagrees with the primary one.
fn align(options: &mut BTreeMap<Language, Vec<String>>) {
    let target = primary_language(options)
        .and_then(|lang| options.get(&lang))
        .map(Vec::len);
    if let Some(target) = target {
        options.retain(|lang, opts| {
            let keep = opts.len() == target;
            if !keep {
                debug!("Dropping {} options: {} vs {}", lang.code(), opts.len(), target);
            }
            keep
        });
    }
}
