//! Achievement Detection
//!
//! Post-game badges computed from the answer log. Every predicate is
//! evaluated independently and each badge appears at most once. Empty or
//! partial logs simply award nothing.

use serde::{Serialize, Deserialize};

use crate::game::state::Answer;

/// Max spread of correct response times for Consistency King.
pub const CONSISTENCY_SPREAD_MS: u64 = 2000;

/// Remaining budget below which a correct answer counts as last-second.
pub const LAST_SECOND_MS: u64 = 1000;

/// Named performance badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Every question correct
    PerfectScore,
    /// ≥ 80% of questions correct in under half the budget
    SpeedDemon,
    /// ≥ 2 wrong in the first half, ≥ 3 correct in the second
    ComebackKid,
    /// Correct response times within a 2 s spread
    ConsistencyKing,
    /// ≥ 3 correct with under 1 s left
    LastSecondHero,
}

impl Achievement {
    /// Stable identifier for storage.
    pub fn code(self) -> &'static str {
        match self {
            Achievement::PerfectScore => "perfect_score",
            Achievement::SpeedDemon => "speed_demon",
            Achievement::ComebackKid => "comeback_kid",
            Achievement::ConsistencyKing => "consistency_king",
            Achievement::LastSecondHero => "last_second_hero",
        }
    }

    /// Display title.
    pub fn title(self) -> &'static str {
        match self {
            Achievement::PerfectScore => "Perfect Score",
            Achievement::SpeedDemon => "Speed Demon",
            Achievement::ComebackKid => "Comeback Kid",
            Achievement::ConsistencyKing => "Consistency King",
            Achievement::LastSecondHero => "Last-Second Hero",
        }
    }
}

/// Evaluate every achievement against a finished (or partial) log.
pub fn detect_achievements(answers: &[Answer], total_score: u32, question_count: usize) -> Vec<Achievement> {
    let mut earned = Vec::new();
    if answers.is_empty() || question_count == 0 {
        return earned;
    }

    let correct = answers.iter().filter(|a| a.is_correct).count();

    if total_score > 0 && correct == question_count {
        earned.push(Achievement::PerfectScore);
    }

    let fast_correct = answers
        .iter()
        .filter(|a| a.is_correct && a.response_time_ms * 2 < a.time_budget_ms)
        .count();
    if fast_correct * 5 >= question_count * 4 {
        earned.push(Achievement::SpeedDemon);
    }

    let half = (question_count / 2).min(answers.len());
    let (first, second) = answers.split_at(half);
    let early_wrong = first.iter().filter(|a| !a.is_correct).count();
    let late_right = second.iter().filter(|a| a.is_correct).count();
    if early_wrong >= 2 && late_right >= 3 {
        earned.push(Achievement::ComebackKid);
    }

    let mut correct_times = answers
        .iter()
        .filter(|a| a.is_correct)
        .map(|a| a.response_time_ms);
    if let Some(first_time) = correct_times.next() {
        let (min, max, n) = correct_times.fold((first_time, first_time, 1usize), |(lo, hi, n), t| {
            (lo.min(t), hi.max(t), n + 1)
        });
        if n >= 2 && max - min <= CONSISTENCY_SPREAD_MS {
            earned.push(Achievement::ConsistencyKing);
        }
    }

    let clutch = answers
        .iter()
        .filter(|a| a.is_correct && a.time_remaining_ms() < LAST_SECOND_MS)
        .count();
    if clutch >= 3 {
        earned.push(Achievement::LastSecondHero);
    }

    earned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::question::Difficulty;

    fn answer(correct: bool, ms: u64) -> Answer {
        Answer {
            question_id: String::from("q"),
            selected_option_index: Some(if correct { 0 } else { 1 }),
            is_correct: correct,
            response_time_ms: ms,
            time_budget_ms: 6000,
            difficulty: Difficulty::Medium,
            points: 0,
        }
    }

    #[test]
    fn test_empty_log_awards_nothing() {
        assert!(detect_achievements(&[], 0, 10).is_empty());
        assert!(detect_achievements(&[answer(true, 100)], 150, 0).is_empty());
    }

    #[test]
    fn test_perfect_and_speed_demon() {
        let log: Vec<_> = (0..5).map(|_| answer(true, 1000)).collect();
        let earned = detect_achievements(&log, 750, 5);
        assert!(earned.contains(&Achievement::PerfectScore));
        assert!(earned.contains(&Achievement::SpeedDemon));
        assert!(earned.contains(&Achievement::ConsistencyKing));
        assert!(!earned.contains(&Achievement::LastSecondHero));
    }

    #[test]
    fn test_partial_log_not_perfect() {
        let log: Vec<_> = (0..3).map(|_| answer(true, 1000)).collect();
        let earned = detect_achievements(&log, 450, 5);
        assert!(!earned.contains(&Achievement::PerfectScore));
        // 3 of 5 fast is 60%
        assert!(!earned.contains(&Achievement::SpeedDemon));
    }

    #[test]
    fn test_speed_demon_threshold() {
        let mut log: Vec<_> = (0..8).map(|_| answer(true, 2999)).collect();
        log.push(answer(false, 1000));
        log.push(answer(true, 3000)); // exactly half is not "under half"
        assert!(detect_achievements(&log, 1000, 10).contains(&Achievement::SpeedDemon));

        log[0] = answer(true, 3000);
        assert!(!detect_achievements(&log, 1000, 10).contains(&Achievement::SpeedDemon));
    }

    #[test]
    fn test_comeback_kid() {
        let log = vec![
            answer(false, 1000),
            answer(false, 1000),
            answer(true, 1000),
            answer(true, 1000),
            answer(true, 1000),
            answer(true, 1000),
        ];
        assert!(detect_achievements(&log, 600, 6).contains(&Achievement::ComebackKid));

        let log = vec![
            answer(false, 1000),
            answer(true, 1000),
            answer(true, 1000),
            answer(true, 1000),
            answer(true, 1000),
            answer(true, 1000),
        ];
        assert!(!detect_achievements(&log, 600, 6).contains(&Achievement::ComebackKid));
    }

    #[test]
    fn test_consistency_king_spread() {
        let log = vec![answer(true, 1000), answer(true, 3000), answer(false, 100)];
        assert!(detect_achievements(&log, 300, 3).contains(&Achievement::ConsistencyKing));

        let log = vec![answer(true, 1000), answer(true, 3001)];
        assert!(!detect_achievements(&log, 300, 2).contains(&Achievement::ConsistencyKing));

        // A single correct answer has no spread to judge
        let log = vec![answer(true, 1000), answer(false, 1000)];
        assert!(!detect_achievements(&log, 150, 2).contains(&Achievement::ConsistencyKing));
    }

    #[test]
    fn test_last_second_hero() {
        let log = vec![
            answer(true, 5100),
            answer(true, 5500),
            answer(true, 5999),
            answer(false, 5900),
        ];
        let earned = detect_achievements(&log, 330, 4);
        assert!(earned.contains(&Achievement::LastSecondHero));

        let log = vec![answer(true, 5100), answer(true, 5000), answer(true, 5999)];
        assert!(!detect_achievements(&log, 330, 3).contains(&Achievement::LastSecondHero));
    }

    #[test]
    fn test_each_awarded_once() {
        let log: Vec<_> = (0..10).map(|_| answer(true, 1000)).collect();
        let earned = detect_achievements(&log, 1500, 10);
        let mut deduped = earned.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(earned.len(), deduped.len());
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(Achievement::LastSecondHero.code(), "last_second_hero");
        assert_eq!(Achievement::ComebackKid.title(), "Comeback Kid");
    }
}
