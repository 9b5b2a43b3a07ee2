//! Opponent Simulation
//!
//! Single-player contests are played against generated rivals whose
//! scores cluster around the player's: 30% (rounded down) land 1-15% above,
//! the rest 5-30% below, clamped to [20% of max, max]. Everything is drawn
//! from [`DeterministicRng`], so a seed fully determines the field.

use crate::core::rng::DeterministicRng;
use crate::game::completion::CompletionError;
use crate::game::leaderboard::{PlayerEntry, PlayerKind};
use crate::game::state::PlayerId;

/// Names handed out to simulated rivals, in draw order.
pub const OPPONENT_NAMES: [&str; 12] = [
    "Nour", "Omar", "Layla", "Yusuf", "Sara", "Khalid",
    "Mariam", "Hassan", "Aisha", "Tariq", "Huda", "Zaid",
];

/// Everything opponent generation needs to know about the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpponentParams {
    /// Real player's final score
    pub player_score: u32,
    /// Best achievable score for this question set
    pub max_possible_score: u32,
    /// Questions played
    pub question_count: usize,
    /// Per-question budget
    pub time_budget_ms: u64,
    /// Rivals wanted
    pub count: usize,
}

/// Produces simulated rivals at completion time.
pub trait OpponentGenerator: Send {
    /// Generate `params.count` rivals.
    fn generate(&mut self, params: &OpponentParams) -> Result<Vec<PlayerEntry>, CompletionError>;
}

/// Default generator backed by a seeded RNG.
#[derive(Clone, Debug)]
pub struct SeededOpponents {
    rng: DeterministicRng,
}

impl SeededOpponents {
    /// Generator with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self { rng: DeterministicRng::new(seed) }
    }
}

impl OpponentGenerator for SeededOpponents {
    fn generate(&mut self, params: &OpponentParams) -> Result<Vec<PlayerEntry>, CompletionError> {
        if params.count == 0 {
            return Ok(Vec::new());
        }
        if params.max_possible_score == 0 || params.question_count == 0 {
            return Err(CompletionError::OpponentGeneration(String::from(
                "no scoring range to place opponents in",
            )));
        }
        Ok(simulate_opponents(params, &mut self.rng))
    }
}

/// How many rivals finish above the player (30%, rounded down).
#[inline]
pub fn higher_count(count: usize) -> usize {
    count * 3 / 10
}

/// Generate rivals around the player's score.
pub fn simulate_opponents(params: &OpponentParams, rng: &mut DeterministicRng) -> Vec<PlayerEntry> {
    let max = u64::from(params.max_possible_score);
    let floor = max / 5;
    let base = u64::from(params.player_score);
    let above = higher_count(params.count);
    let questions = params.question_count as u64;
    let per_question = (max / questions.max(1)).max(1);

    (0..params.count)
        .map(|i| {
            let raw = if i < above {
                base * u64::from(100 + rng.next_u32_range(1, 15)) / 100
            } else {
                base * u64::from(100 - rng.next_u32_range(5, 30)) / 100
            };
            let score = raw.clamp(floor, max);

            // Enough correct answers to plausibly reach the score
            let correct = score.div_ceil(per_question).min(questions);

            // Per-question latency between 20% and 90% of the budget
            let low = params.time_budget_ms / 5;
            let high = (u128::from(params.time_budget_ms) * 9 / 10) as u64;
            let total_time = (0..questions)
                .map(|_| rng.next_u64_range(low, high))
                .fold(0u64, u64::saturating_add);

            let name = OPPONENT_NAMES[i % OPPONENT_NAMES.len()];
            PlayerEntry {
                id: random_id(rng),
                name: if i < OPPONENT_NAMES.len() {
                    name.to_string()
                } else {
                    format!("{} {}", name, i / OPPONENT_NAMES.len() + 1)
                },
                kind: PlayerKind::Simulated,
                score: score as u32,
                correct_count: correct as u32,
                total_response_time_ms: total_time,
            }
        })
        .collect()
}

fn random_id(rng: &mut DeterministicRng) -> PlayerId {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&rng.next_u64().to_le_bytes());
    bytes[8..].copy_from_slice(&rng.next_u64().to_le_bytes());
    PlayerId::new(bytes)
}
