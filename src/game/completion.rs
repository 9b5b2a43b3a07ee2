//! Completion Pipeline
//!
//! Runs once when the last question resolves: ranking, opponents,
//! achievements and the history record. Each step that can fail has a
//! local fallback so the host always receives a report.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::game::achievements::{detect_achievements, Achievement};
use crate::game::leaderboard::{
    find_real, rank_by_score, rank_players, PlayerEntry, PlayerKind, PlayerResult,
};
use crate::game::opponents::{OpponentGenerator, OpponentParams};
use crate::game::scoring::{max_possible_score, total_score};
use crate::game::state::{GameSession, PlayerId};
use crate::persistence::record::GameHistoryRecord;

/// Display name of the real player on the leaderboard.
pub const PLAYER_DISPLAY_NAME: &str = "You";

/// Failures inside the completion pipeline. Never reach the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// Opponent generator failed.
    #[error("opponent generation failed: {0}")]
    OpponentGeneration(String),

    /// More answers than questions.
    #[error("answer log has {answers} entries for {questions} questions")]
    InconsistentLog {
        /// Answers logged
        answers: usize,
        /// Questions in session
        questions: usize,
    },

    /// Two leaderboard entries share an id.
    #[error("duplicate player id {0}")]
    DuplicatePlayer(String),
}

/// Inputs to [`run_completion`].
#[derive(Clone, Copy, Debug)]
pub struct CompletionInput<'a> {
    /// Finished session
    pub session: &'a GameSession,
    /// Prize pool to split
    pub prize_pool: u64,
    /// Simulated rivals to generate
    pub opponent_count: usize,
    /// Contest the session belongs to
    pub contest_id: Option<&'a str>,
    /// Completion timestamp for the record
    pub completed_at: DateTime<Utc>,
}

/// Final outcome delivered to the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Session id (hex)
    pub session_id: String,
    /// Real player
    pub player_id: PlayerId,
    /// Final score
    pub score: u32,
    /// Correct answers
    pub correct_count: u32,
    /// Questions played
    pub question_count: u32,
    /// Everyone, ranked
    pub standings: Vec<PlayerResult>,
    /// Real player's rank
    pub player_rank: u32,
    /// Real player's prize
    pub prize: u64,
    /// Badges earned
    pub achievements: Vec<Achievement>,
    /// Record handed to persistence
    pub record: GameHistoryRecord,
    /// True if any step fell back to a default
    pub degraded: bool,
}

/// Build the full completion report for a finished session.
pub fn run_completion(
    input: &CompletionInput<'_>,
    opponents: &mut dyn OpponentGenerator,
) -> CompletionReport {
    let session = input.session;
    let mut degraded = false;

    let score = total_score(&session.answers);
    let player = PlayerEntry {
        id: session.player_id,
        name: PLAYER_DISPLAY_NAME.to_string(),
        kind: PlayerKind::Real,
        score,
        correct_count: session.correct_count() as u32,
        total_response_time_ms: session.total_response_time_ms(),
    };

    let params = OpponentParams {
        player_score: score,
        max_possible_score: max_possible_score(&session.questions, session.time_budget_ms),
        question_count: session.question_count(),
        time_budget_ms: session.time_budget_ms,
        count: input.opponent_count,
    };
    let rivals = match opponents.generate(&params) {
        Ok(rivals) => rivals,
        Err(e) => {
            warn!("Opponent generation failed, playing solo: {}", e);
            degraded = true;
            Vec::new()
        }
    };

    let mut entries = Vec::with_capacity(rivals.len() + 1);
    entries.push(player.clone());
    entries.extend(rivals);

    let standings = match build_leaderboard(entries.clone(), input.prize_pool) {
        Ok(standings) => standings,
        Err(e) => {
            warn!("Leaderboard failed, falling back to score order: {}", e);
            degraded = true;
            rank_by_score(entries)
        }
    };

    let achievements = match check_log(session) {
        Ok(()) => detect_achievements(&session.answers, score, session.question_count()),
        Err(e) => {
            warn!("Skipping achievements: {}", e);
            degraded = true;
            Vec::new()
        }
    };

    let me = find_real(&standings).cloned().unwrap_or_else(|| {
        degraded = true;
        minimal_result(player)
    });

    let record = GameHistoryRecord::from_completion(
        session,
        &me,
        &achievements,
        input.contest_id,
        input.completed_at,
    );

    info!(
        "Session {} complete: score {}, rank {}/{}, prize {}, {} achievements",
        hex::encode(&session.session_id[..4]),
        score,
        me.rank,
        standings.len(),
        me.prize,
        achievements.len()
    );

    CompletionReport {
        session_id: hex::encode(session.session_id),
        player_id: session.player_id,
        score,
        correct_count: me.correct_count,
        question_count: session.question_count() as u32,
        player_rank: me.rank,
        prize: me.prize,
        standings,
        achievements,
        record,
        degraded,
    }
}

/// Rank entries after checking ids are unique.
pub fn build_leaderboard(entries: Vec<PlayerEntry>, prize_pool: u64) -> Result<Vec<PlayerResult>, CompletionError> {
    let mut ids: Vec<PlayerId> = entries.iter().map(|e| e.id).collect();
    ids.sort();
    if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
        return Err(CompletionError::DuplicatePlayer(pair[0].to_uuid_string()));
    }
    Ok(rank_players(entries, prize_pool))
}

fn check_log(session: &GameSession) -> Result<(), CompletionError> {
    if session.answers.len() > session.question_count() {
        return Err(CompletionError::InconsistentLog {
            answers: session.answers.len(),
            questions: session.question_count(),
        });
    }
    Ok(())
}

fn minimal_result(player: PlayerEntry) -> PlayerResult {
    PlayerResult {
        id: player.id,
        name: player.name,
        kind: player.kind,
        score: player.score,
        correct_count: player.correct_count,
        total_response_time_ms: player.total_response_time_ms,
        rank: 1,
        prize: 0,
    }
}

// =============================================================================
// TESTS
// =============================================================================
