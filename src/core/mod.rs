//! Core primitives.
//!
//! Deterministic randomness and the clock abstraction. Nothing in here
//! knows about quizzes.

pub mod rng;
pub mod clock;

// Re-export core types
pub use rng::{derive_session_seed, DeterministicRng};
pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
