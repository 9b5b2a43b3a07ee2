//! History Records
//!
//! Storable summary of one completed session.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::game::achievements::Achievement;
use crate::game::leaderboard::PlayerResult;
use crate::game::question::Difficulty;
use crate::game::scoring::average_response_time_ms;
use crate::game::state::GameSession;

/// How the player did on one question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPerformance {
    /// Question id
    pub question_id: String,
    /// Category label
    pub category: String,
    /// Difficulty tier
    pub difficulty: Difficulty,
    /// Option picked (None = timeout)
    pub selected_option_index: Option<usize>,
    /// Correct option
    pub correct_option_index: usize,
    /// Was it right?
    pub is_correct: bool,
    /// Latency
    pub response_time_ms: u64,
    /// Points scored
    pub points: u32,
}

/// One completed session as stored remotely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistoryRecord {
    /// Unique record id
    pub record_id: String,
    /// Session id (hex)
    pub session_id: String,
    /// Player (UUID string)
    pub user_id: String,
    /// Contest, if any
    pub contest_id: Option<String>,
    /// Final score
    pub score: u32,
    /// Final rank
    pub rank: u32,
    /// Correct answers
    pub correct_answers: u32,
    /// Questions played
    pub total_questions: u32,
    /// Prize won
    pub earnings: u64,
    /// Mean latency over all answers
    pub average_response_time_ms: u64,
    /// Achievement codes
    pub achievements: Vec<String>,
    /// Per-question breakdown
    pub performance: Vec<QuestionPerformance>,
    /// When the session finished
    pub completed_at: DateTime<Utc>,
}

impl GameHistoryRecord {
    /// Build a record from the finished session and the player's standing.
    pub fn from_completion(
        session: &GameSession,
        result: &PlayerResult,
        achievements: &[Achievement],
        contest_id: Option<&str>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let performance = session
            .answers
            .iter()
            .map(|answer| {
                let question = session.questions.iter().find(|q| q.id == answer.question_id);
                QuestionPerformance {
                    question_id: answer.question_id.clone(),
                    category: question.map(|q| q.category.clone()).unwrap_or_default(),
                    difficulty: answer.difficulty,
                    selected_option_index: answer.selected_option_index,
                    correct_option_index: question.map(|q| q.correct_option_index).unwrap_or_default(),
                    is_correct: answer.is_correct,
                    response_time_ms: answer.response_time_ms,
                    points: answer.points,
                }
            })
            .collect();

        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            session_id: hex::encode(session.session_id),
            user_id: session.player_id.to_uuid_string(),
            contest_id: contest_id.map(str::to_string),
            score: result.score,
            rank: result.rank,
            correct_answers: result.correct_count,
            total_questions: session.question_count() as u32,
            earnings: result.prize,
            average_response_time_ms: average_response_time_ms(&session.answers),
            achievements: achievements.iter().map(|a| a.code().to_string()).collect(),
            performance,
            completed_at,
        }
    }

    /// Fraction of questions answered correctly, in percent.
    pub fn accuracy_percent(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        self.correct_answers * 100 / self.total_questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::leaderboard::PlayerKind;
    use crate::game::question::Question;
    use crate::game::state::{Answer, PlayerId};

    #[test]
    fn test_record_from_session() {
        let q1 = Question::new("q1", "t", vec!["a".into(), "b".into()], 1, Difficulty::Hard).with_category("science");
        let q2 = Question::new("q2", "t", vec!["a".into(), "b".into()], 0, Difficulty::Easy);
        let mut session = GameSession::new([3; 16], PlayerId::new([4; 16]), vec![q1.clone(), q2.clone()], 6000);
        session.record_answer(Answer {
            question_id: "q1".into(),
            selected_option_index: Some(1),
            is_correct: true,
            response_time_ms: 2000,
            time_budget_ms: 6000,
            difficulty: Difficulty::Hard,
            points: 225,
        });
        session.record_answer(Answer::timeout(&q2, 6000));

        let result = PlayerResult {
            id: session.player_id,
            name: "You".into(),
            kind: PlayerKind::Real,
            score: session.score,
            correct_count: 1,
            total_response_time_ms: 8000,
            rank: 2,
            prize: 270,
        };

        let record = GameHistoryRecord::from_completion(
            &session,
            &result,
            &[Achievement::ConsistencyKing],
            None,
            Utc::now(),
        );

        assert_eq!(record.score, 225);
        assert_eq!(record.rank, 2);
        assert_eq!(record.earnings, 270);
        assert_eq!(record.total_questions, 2);
        assert_eq!(record.average_response_time_ms, 4000);
        assert_eq!(record.accuracy_percent(), 50);
        assert_eq!(record.achievements, vec!["consistency_king".to_string()]);
        assert_eq!(record.performance[0].category, "science");
        assert_eq!(record.performance[0].correct_option_index, 1);
        assert_eq!(record.performance[1].selected_option_index, None);
        assert_eq!(record.session_id, hex::encode([3u8; 16]));
    }
}
