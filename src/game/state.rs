//! Game State Definitions
//!
//! Session, answer and phase types. The engine is the only writer;
//! everything else reads completed data.

use serde::{Serialize, Deserialize};

use crate::game::question::{Difficulty, Question};
use crate::game::scoring::total_score;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Implements Ord so leaderboard tie-breaks are deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Short hex prefix for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

// =============================================================================
// ANSWER
// =============================================================================

/// One player's response to one question. Never mutated once logged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Question this answers
    pub question_id: String,

    /// Chosen option, `None` on timeout
    pub selected_option_index: Option<usize>,

    /// Always false when nothing was selected
    pub is_correct: bool,

    /// Display-to-submit latency, or the full budget on timeout
    pub response_time_ms: u64,

    /// Budget the question was played with
    pub time_budget_ms: u64,

    /// Difficulty of the question (kept so the log alone determines score)
    pub difficulty: Difficulty,

    /// Points awarded
    pub points: u32,
}

impl Answer {
    /// Answer synthesized when the timer expires unanswered.
    pub fn timeout(question: &Question, time_budget_ms: u64) -> Self {
        Self {
            question_id: question.id.clone(),
            selected_option_index: None,
            is_correct: false,
            response_time_ms: time_budget_ms,
            time_budget_ms,
            difficulty: question.difficulty,
            points: 0,
        }
    }

    /// Did the player let the clock run out?
    #[inline]
    pub fn timed_out(&self) -> bool {
        self.selected_option_index.is_none()
    }

    /// Budget left at submission.
    #[inline]
    pub fn time_remaining_ms(&self) -> u64 {
        self.time_budget_ms.saturating_sub(self.response_time_ms)
    }
}

// =============================================================================
// PHASES
// =============================================================================

/// Session lifecycle. Strictly forward-moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum SessionPhase {
    /// Lobby / pre-game countdown
    #[default]
    Waiting,
    /// Questions in play
    Playing,
    /// Terminal
    Completed,
}

impl SessionPhase {
    /// Only the immediate successor is reachable.
    pub fn can_transition_to(self, next: SessionPhase) -> bool {
        matches!(
            (self, next),
            (SessionPhase::Waiting, SessionPhase::Playing)
                | (SessionPhase::Playing, SessionPhase::Completed)
        )
    }
}

/// Sub-state of the current question while `Playing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPhase {
    /// Accepting an answer until the timer fires
    Active,
    /// Timer fired, correct answer revealed
    Resolved,
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// Live state for one playthrough.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSession {
    /// Session identifier
    pub session_id: [u8; 16],

    /// Player this session belongs to
    pub player_id: PlayerId,

    /// Question order, fixed at start
    pub questions: Vec<Question>,

    /// Index of the active (or last resolved) question
    pub current_index: usize,

    /// Per-question time budget
    pub time_budget_ms: u64,

    /// Cumulative score, always `total_score(&answers)`
    pub score: u32,

    /// Ordered answer log
    pub answers: Vec<Answer>,

    /// Consecutive correct answers
    pub streak: u32,

    /// Longest streak this session
    pub best_streak: u32,

    /// Lifecycle phase
    pub phase: SessionPhase,

    /// Sub-state of the current question
    pub question_phase: QuestionPhase,

    /// When the current question was shown
    pub question_started_at_ms: u64,
}

impl GameSession {
    /// Create a session in `Waiting`.
    pub fn new(
        session_id: [u8; 16],
        player_id: PlayerId,
        questions: Vec<Question>,
        time_budget_ms: u64,
    ) -> Self {
        Self {
            session_id,
            player_id,
            questions,
            current_index: 0,
            time_budget_ms,
            score: 0,
            answers: Vec::new(),
            streak: 0,
            best_streak: 0,
            phase: SessionPhase::Waiting,
            question_phase: QuestionPhase::Active,
            question_started_at_ms: 0,
        }
    }

    /// Move to `next` if it is the immediate successor phase.
    pub fn advance_phase(&mut self, next: SessionPhase) -> bool {
        if self.phase.can_transition_to(next) {
            self.phase = next;
            true
        } else {
            false
        }
    }

    /// Number of questions in the session.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Question at the current index.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// Is the current question the final one?
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// Has the current question already got an answer in the log?
    pub fn current_answered(&self) -> bool {
        self.answers.len() > self.current_index
    }

    /// Append an answer and refresh score and streak.
    pub fn record_answer(&mut self, answer: Answer) {
        if answer.is_correct {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        self.answers.push(answer);
        self.score = total_score(&self.answers);
    }

    /// Correct answers so far.
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    /// Sum of response times (timeouts count the full budget).
    pub fn total_response_time_ms(&self) -> u64 {
        self.answers.iter().map(|a| a.response_time_ms).sum()
    }

    /// Time left on the current question at `now_ms`.
    pub fn time_remaining_ms(&self, now_ms: u64) -> u64 {
        if self.phase != SessionPhase::Playing || self.question_phase != QuestionPhase::Active {
            return 0;
        }
        let elapsed = now_ms.saturating_sub(self.question_started_at_ms);
        self.time_budget_ms.saturating_sub(elapsed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
