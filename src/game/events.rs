//! Game Events
//!
//! Outbound notifications for the host. A snapshot is emitted after every
//! state mutation rather than on a fixed tick, so hosts re-render on demand.

use serde::{Serialize, Deserialize};

use crate::game::completion::CompletionReport;
use crate::game::question::Question;
use crate::game::state::{Answer, GameSession, QuestionPhase, SessionPhase};

/// Everything the host needs to render the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Lifecycle phase
    pub phase: SessionPhase,
    /// Sub-state of the current question
    pub question_phase: QuestionPhase,
    /// Current question index
    pub current_index: usize,
    /// Total questions
    pub question_count: usize,
    /// Time left to answer
    pub time_remaining_ms: u64,
    /// Score so far
    pub score: u32,
    /// Consecutive correct answers
    pub streak: u32,
    /// Has the current question been answered?
    pub answered: bool,
    /// Should the host reveal the correct option?
    pub reveal_answer: bool,
    /// Question on screen
    pub question: Option<Question>,
    /// Answer given to the current question, if any
    pub answer: Option<Answer>,
}

impl SessionSnapshot {
    /// Capture the visible fields of `session` at `now_ms`.
    pub fn capture(session: &GameSession, now_ms: u64) -> Self {
        let answered = session.current_answered();
        let resolved = session.question_phase == QuestionPhase::Resolved
            || session.phase == SessionPhase::Completed;

        Self {
            phase: session.phase,
            question_phase: session.question_phase,
            current_index: session.current_index,
            question_count: session.question_count(),
            time_remaining_ms: session.time_remaining_ms(now_ms),
            score: session.score,
            streak: session.streak,
            answered,
            reveal_answer: session.phase != SessionPhase::Waiting && (answered || resolved),
            question: match session.phase {
                SessionPhase::Waiting => None,
                _ => session.current_question().cloned(),
            },
            answer: session.answers.get(session.current_index).cloned(),
        }
    }
}

/// Notification emitted by the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Session state changed
    StateChanged(SessionSnapshot),
    /// Session completed, final standings attached
    Completed(CompletionReport),
}

impl GameEvent {
    /// Snapshot carried by a state change.
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            GameEvent::StateChanged(snapshot) => Some(snapshot),
            GameEvent::Completed(_) => None,
        }
    }

    /// Serialize for hosts that consume JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::question::Difficulty;
    use crate::game::state::PlayerId;

    fn session() -> GameSession {
        let q = Question::new("q1", "text", vec!["a".into(), "b".into()], 1, Difficulty::Medium);
        GameSession::new([0; 16], PlayerId::default(), vec![q], 6000)
    }

    #[test]
    fn test_waiting_snapshot_hides_question() {
        let snapshot = SessionSnapshot::capture(&session(), 0);
        assert_eq!(snapshot.phase, SessionPhase::Waiting);
        assert!(snapshot.question.is_none());
        assert!(!snapshot.reveal_answer);
        assert_eq!(snapshot.time_remaining_ms, 0);
    }

    #[test]
    fn test_playing_snapshot_time_remaining() {
        let mut s = session();
        s.phase = SessionPhase::Playing;
        s.question_started_at_ms = 1000;

        let snapshot = SessionSnapshot::capture(&s, 2500);
        assert_eq!(snapshot.time_remaining_ms, 4500);
        assert_eq!(snapshot.question.as_ref().map(|q| q.id.as_str()), Some("q1"));
        assert!(!snapshot.answered);
    }

    #[test]
    fn test_event_json_tagged() {
        let event = GameEvent::StateChanged(SessionSnapshot::capture(&session(), 0));
        let json = event.to_json().unwrap();
        assert!(json.contains("\"type\":\"state_changed\""));
        assert!(event.snapshot().is_some());
    }
}
