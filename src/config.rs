//! Session Configuration
//!
//! Options the host passes when starting a session. Loadable from JSON
//! (camelCase keys, every key optional) or from `QUIZ_*` environment
//! variables layered over the defaults.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::warn;

use crate::{DEFAULT_QUESTION_COUNT, DEFAULT_TIME_PER_QUESTION_MS};

/// Longest answer window accepted.
pub const MAX_TIME_PER_QUESTION_MS: u64 = 120_000;

/// Upper bound on simulated rivals.
pub const MAX_OPPONENTS: usize = 99;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON did not parse.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment variable held an unparseable value.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

/// Per-session options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Answer window per question.
    pub time_per_question_ms: u64,
    /// Questions per session.
    pub question_count: usize,
    /// Host plays sounds. Passed through untouched.
    pub sound_enabled: bool,
    /// Host plays haptics. Passed through untouched.
    pub haptics_enabled: bool,
    /// Lobby countdown before the first question (0 starts immediately).
    pub countdown_ms: u64,
    /// Prize pool split between the top three.
    pub prize_pool: u64,
    /// Simulated rivals for single-player contests.
    pub opponent_count: usize,
    /// Fixed seed for opponent simulation; derived from the session if unset.
    pub seed: Option<u64>,
    /// Let the supply fall back to built-in questions.
    pub allow_emergency_questions: bool,
    /// Contest the session belongs to, if any.
    pub contest_id: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            time_per_question_ms: DEFAULT_TIME_PER_QUESTION_MS,
            question_count: DEFAULT_QUESTION_COUNT,
            sound_enabled: true,
            haptics_enabled: true,
            countdown_ms: 3000,
            prize_pool: 0,
            opponent_count: 0,
            seed: None,
            allow_emergency_questions: true,
            contest_id: None,
        }
    }
}

impl GameConfig {
    /// Parse from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.validated())
    }

    /// Defaults overridden by `QUIZ_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GameConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "QUIZ_TIME_PER_QUESTION_MS")? {
            config.time_per_question_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "QUIZ_QUESTION_COUNT")? {
            config.question_count = v;
        }
        if let Some(v) = parse_flag(&lookup, "QUIZ_SOUND_ENABLED")? {
            config.sound_enabled = v;
        }
        if let Some(v) = parse_flag(&lookup, "QUIZ_HAPTICS_ENABLED")? {
            config.haptics_enabled = v;
        }
        if let Some(v) = parse_var(&lookup, "QUIZ_COUNTDOWN_MS")? {
            config.countdown_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "QUIZ_PRIZE_POOL")? {
            config.prize_pool = v;
        }
        if let Some(v) = parse_var(&lookup, "QUIZ_OPPONENT_COUNT")? {
            config.opponent_count = v;
        }
        if let Some(v) = parse_var(&lookup, "QUIZ_SEED")? {
            config.seed = Some(v);
        }
        if let Some(v) = lookup("QUIZ_CONTEST_ID") {
            config.contest_id = Some(v);
        }

        Ok(config.validated())
    }

    /// Clamp values that would stall or break a session.
    pub fn validated(mut self) -> Self {
        if self.time_per_question_ms == 0 {
            warn!("time_per_question_ms = 0, using default {}", DEFAULT_TIME_PER_QUESTION_MS);
            self.time_per_question_ms = DEFAULT_TIME_PER_QUESTION_MS;
        } else if self.time_per_question_ms > MAX_TIME_PER_QUESTION_MS {
            warn!("time_per_question_ms {} too long, clamping", self.time_per_question_ms);
            self.time_per_question_ms = MAX_TIME_PER_QUESTION_MS;
        }
        if self.question_count == 0 {
            warn!("question_count = 0, using default {}", DEFAULT_QUESTION_COUNT);
            self.question_count = DEFAULT_QUESTION_COUNT;
        }
        if self.opponent_count > MAX_OPPONENTS {
            warn!("opponent_count {} too high, clamping", self.opponent_count);
            self.opponent_count = MAX_OPPONENTS;
        }
        self
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

fn parse_flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.time_per_question_ms, 6000);
        assert_eq!(config.question_count, 10);
        assert!(config.sound_enabled);
        assert!(config.haptics_enabled);
    }

    #[test]
    fn test_from_json_partial() {
        let config = GameConfig::from_json(r#"{"timePerQuestionMs": 9000, "soundEnabled": false}"#).unwrap();
        assert_eq!(config.time_per_question_ms, 9000);
        assert!(!config.sound_enabled);
        assert_eq!(config.question_count, 10);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(GameConfig::from_json("{not json"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = GameConfig::from_lookup(lookup_from(&[
            ("QUIZ_QUESTION_COUNT", "5"),
            ("QUIZ_HAPTICS_ENABLED", "off"),
            ("QUIZ_PRIZE_POOL", "900"),
            ("QUIZ_SEED", "42"),
        ]))
        .unwrap();

        assert_eq!(config.question_count, 5);
        assert!(!config.haptics_enabled);
        assert_eq!(config.prize_pool, 900);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_from_lookup_bad_value() {
        let result = GameConfig::from_lookup(lookup_from(&[("QUIZ_QUESTION_COUNT", "ten")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "QUIZ_QUESTION_COUNT", .. })
        ));
    }

    #[test]
    fn test_validated_clamps() {
        let config = GameConfig {
            time_per_question_ms: 0,
            question_count: 0,
            opponent_count: 1000,
            ..Default::default()
        }
        .validated();

        assert_eq!(config.time_per_question_ms, DEFAULT_TIME_PER_QUESTION_MS);
        assert_eq!(config.question_count, DEFAULT_QUESTION_COUNT);
        assert_eq!(config.opponent_count, MAX_OPPONENTS);
    }
}
