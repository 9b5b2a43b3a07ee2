//! Question Supply Module
//!
//! Fetches raw questions, normalizes them, and fills a session with
//! exactly the number requested.

pub mod raw;
pub mod emergency;
pub mod source;
pub mod memory;

use thiserror::Error;

pub use raw::{normalize, normalize_all, NormalizeError};
pub use emergency::emergency_questions;
pub use source::{QuestionBank, QuestionSupply, SeenQuestionStore};
pub use memory::{InMemoryQuestionBank, InMemorySeenStore};

/// Question supply errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupplyError {
    /// Nothing playable, not even the emergency set.
    #[error("no questions available")]
    NoQuestionsAvailable,

    /// Bank unreachable.
    #[error("question bank unavailable: {0}")]
    BankUnavailable(String),

    /// Seen-question store unreachable.
    #[error("seen-question store unavailable: {0}")]
    SeenStoreUnavailable(String),
}
