//! Game Logic Module
//!
//! Everything that decides what happens in a session. Synchronous and
//! deterministic given the clock values and seeds passed in.
//!
//! ## Module Structure
//!
//! - `question`: Canonical question shape, difficulty, language
//! - `state`: Session, answer log, phases
//! - `scoring`: Pure points functions
//! - `timer`: Single-slot authoritative timer bookkeeping
//! - `engine`: The session state machine
//! - `events`: Notifications for the host
//! - `leaderboard`: Ranking and prize split
//! - `opponents`: Seeded rival simulation
//! - `achievements`: Badges from the finished log
//! - `completion`: End-of-session pipeline

pub mod question;
pub mod state;
pub mod scoring;
pub mod timer;
pub mod engine;
pub mod events;
pub mod leaderboard;
pub mod opponents;
pub mod achievements;
pub mod completion;

// Re-export key types
pub use question::{Difficulty, Language, Question, QuestionError};
pub use state::{Answer, GameSession, PlayerId, QuestionPhase, SessionPhase};
pub use scoring::{points_for_answer, total_score};
pub use timer::{TimerCommand, TimerId, TimerPurpose};
pub use engine::{EngineError, GameEngine, StepResult, SubmitOutcome};
pub use events::{GameEvent, SessionSnapshot};
pub use leaderboard::{rank_players, PlayerKind, PlayerResult};
pub use achievements::Achievement;
pub use completion::{CompletionError, CompletionReport};
