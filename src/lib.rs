//! # Quiz Contest Engine
//!
//! Timed multiple-choice quiz sessions: question supply, an authoritative
//! per-question timer, scoring, a simulated leaderboard with prize split,
//! achievements, and result sync.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    QUIZ CONTEST ENGINE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Primitives                              │
//! │  ├── rng.rs        - Deterministic Xorshift128+ PRNG         │
//! │  └── clock.rs      - Millisecond clocks                      │
//! │                                                              │
//! │  game/             - Session logic (synchronous)             │
//! │  ├── question.rs   - Canonical question shape                │
//! │  ├── state.rs      - Session, answers, phases                │
//! │  ├── scoring.rs    - Points per answer                       │
//! │  ├── timer.rs      - Single authoritative timer slot         │
//! │  ├── engine.rs     - Session state machine                   │
//! │  ├── leaderboard.rs- Ranking and prizes                      │
//! │  ├── opponents.rs  - Simulated rivals                        │
//! │  ├── achievements.rs - Badges                                │
//! │  └── completion.rs - End-of-session pipeline                 │
//! │                                                              │
//! │  supply/           - Question bank normalization + backfill  │
//! │  persistence/      - History records, stats reconciliation   │
//! │  runtime/          - Tokio session driver                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timing Guarantee
//!
//! The engine never sleeps and never measures time itself. Hosts pass
//! `now_ms` in and execute the timer commands that come back, so a session
//! replays identically from its inputs (only the wall-clock stamp on the
//! completion record differs):
//! - One armed timer at a time, stale expiries ignored
//! - An answer is accepted at most once per question
//! - Only the timer advances to the next question
//! - Completion runs exactly once

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod persistence;
pub mod runtime;
pub mod supply;

// Re-export commonly used types
pub use config::GameConfig;
pub use core::rng::DeterministicRng;
pub use game::engine::{GameEngine, StepResult, SubmitOutcome};
pub use game::question::{Difficulty, Language, Question};
pub use game::state::{Answer, GameSession, PlayerId};
pub use runtime::driver::{SessionDriver, SessionHandle};
pub use supply::source::QuestionSupply;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default time budget per question (ms)
pub const DEFAULT_TIME_PER_QUESTION_MS: u64 = 6000;

/// Default number of questions per session
pub const DEFAULT_QUESTION_COUNT: usize = 10;
