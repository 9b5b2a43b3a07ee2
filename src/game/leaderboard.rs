//! Leaderboard & Prize Allocation
//!
//! Ranking is total and deterministic: score descending, then total
//! response time ascending (faster wins a tie), then player id.

use serde::{Serialize, Deserialize};

use crate::game::state::PlayerId;

/// Share of the pool for ranks 1, 2 and 3, in percent.
pub const PRIZE_SHARES: [u64; 3] = [50, 30, 20];

/// Who an entry represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// The human player
    Real,
    /// Generated rival
    Simulated,
}

/// A competitor before ranking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// Player identity
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Real or simulated
    pub kind: PlayerKind,
    /// Total score
    pub score: u32,
    /// Correct answers
    pub correct_count: u32,
    /// Sum of response times
    pub total_response_time_ms: u64,
}

/// A ranked competitor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    /// Player identity
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Real or simulated
    pub kind: PlayerKind,
    /// Total score
    pub score: u32,
    /// Correct answers
    pub correct_count: u32,
    /// Sum of response times
    pub total_response_time_ms: u64,
    /// 1-based position
    pub rank: u32,
    /// Prize won (0 below rank 3)
    pub prize: u64,
}

impl PlayerResult {
    fn from_entry(entry: PlayerEntry, rank: u32, prize: u64) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            kind: entry.kind,
            score: entry.score,
            correct_count: entry.correct_count,
            total_response_time_ms: entry.total_response_time_ms,
            rank,
            prize,
        }
    }
}

/// Prize for a rank, rounded to the nearest unit.
pub fn prize_for_rank(rank: u32, prize_pool: u64) -> u64 {
    match rank {
        1..=3 => {
            let share = PRIZE_SHARES[(rank - 1) as usize];
            ((u128::from(prize_pool) * u128::from(share) + 50) / 100) as u64
        }
        _ => 0,
    }
}

/// Rank all players and split the prize pool.
pub fn rank_players(mut players: Vec<PlayerEntry>, prize_pool: u64) -> Vec<PlayerResult> {
    players.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.total_response_time_ms.cmp(&b.total_response_time_ms))
            .then(a.id.cmp(&b.id))
    });

    players
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let rank = (i + 1) as u32;
            PlayerResult::from_entry(entry, rank, prize_for_rank(rank, prize_pool))
        })
        .collect()
}

/// Fallback ranking by score alone, no prizes.
///
/// Used when the full leaderboard could not be built; stable sort keeps
/// input order for equal scores.
pub fn rank_by_score(mut players: Vec<PlayerEntry>) -> Vec<PlayerResult> {
    players.sort_by(|a, b| b.score.cmp(&a.score));
    players
        .into_iter()
        .enumerate()
        .map(|(i, entry)| PlayerResult::from_entry(entry, (i + 1) as u32, 0))
        .collect()
}

/// The real player's row, if present.
pub fn find_real(results: &[PlayerResult]) -> Option<&PlayerResult> {
    results.iter().find(|r| r.kind == PlayerKind::Real)
}

// =============================================================================
// TESTS
// =============================================================================
