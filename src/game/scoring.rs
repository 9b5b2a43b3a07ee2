//! Scoring
//!
//! Pure functions. Points depend only on response time, budget,
//! difficulty and correctness, so a session's score can always be
//! recomputed from its answer log.
//!
//! Time bonus is a step function of the fraction of budget used:
//!
//! | Elapsed            | Bonus |
//! |--------------------|-------|
//! | ≤ 1/3 of budget    | +50   |
//! | ≤ 2/3 of budget    | +25   |
//! | otherwise          | +10   |
//!
//! There is no streak multiplier.

use crate::game::question::{Difficulty, Question};
use crate::game::state::Answer;

/// Points for any correct answer before bonus and multiplier.
pub const BASE_POINTS: u32 = 100;

/// Bonus for answering within the first third of the budget.
pub const FAST_BONUS: u32 = 50;

/// Bonus for answering within the first two thirds.
pub const MEDIUM_BONUS: u32 = 25;

/// Bonus for any later correct answer.
pub const SLOW_BONUS: u32 = 10;

/// Step time bonus for a correct answer.
#[inline]
pub fn time_bonus(response_time_ms: u64, time_budget_ms: u64) -> u32 {
    // Compare in integers: t <= b/3  <=>  3t <= b
    let scaled = u128::from(response_time_ms) * 3;
    let budget = u128::from(time_budget_ms);
    if scaled <= budget {
        FAST_BONUS
    } else if scaled <= budget * 2 {
        MEDIUM_BONUS
    } else {
        SLOW_BONUS
    }
}

/// Points for a single answer.
///
/// `(BASE_POINTS + bonus) * multiplier`, rounded half up. Zero when wrong.
pub fn points_for_answer(
    response_time_ms: u64,
    time_budget_ms: u64,
    difficulty: Difficulty,
    is_correct: bool,
) -> u32 {
    if !is_correct {
        return 0;
    }
    let raw = BASE_POINTS + time_bonus(response_time_ms, time_budget_ms);
    (raw * difficulty.multiplier_percent() + 50) / 100
}

/// Score of a whole answer log, recomputed from scratch.
pub fn total_score(answers: &[Answer]) -> u32 {
    answers
        .iter()
        .map(|a| points_for_answer(a.response_time_ms, a.time_budget_ms, a.difficulty, a.is_correct))
        .fold(0u32, u32::saturating_add)
}

/// Best achievable score: every answer correct in the fastest band.
pub fn max_possible_score(questions: &[Question], time_budget_ms: u64) -> u32 {
    questions
        .iter()
        .map(|q| points_for_answer(0, time_budget_ms, q.difficulty, true))
        .fold(0u32, u32::saturating_add)
}

/// Mean response time over the log, 0 for an empty log.
pub fn average_response_time_ms(answers: &[Answer]) -> u64 {
    if answers.is_empty() {
        return 0;
    }
    let total: u64 = answers.iter().map(|a| a.response_time_ms).sum();
    total / answers.len() as u64
}

// =============================================================================
// TESTS
// =============================================================================
