//! Game State Machine
//!
//! The single owner of timing and transition decisions for a session.
//! Every entry point takes `&mut self` plus the current time and returns a
//! [`StepResult`]: events for the host and timer commands it must carry
//! out. The engine itself never sleeps or spawns.
//!
//! Only an expiry of the currently armed timer advances the question
//! index. Answers freeze the selection but leave the clock running.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::core::rng::derive_session_seed;
use crate::game::completion::{run_completion, CompletionInput, CompletionReport};
use crate::game::events::{GameEvent, SessionSnapshot};
use crate::game::opponents::{OpponentGenerator, SeededOpponents};
use crate::game::question::Question;
use crate::game::scoring::points_for_answer;
use crate::game::state::{Answer, GameSession, PlayerId, QuestionPhase, SessionPhase};
use crate::game::timer::{ArmedTimer, TimerCommand, TimerId, TimerPurpose, TimerSlot};

/// Host misuse of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `start_session` was already called on this engine.
    #[error("session already started")]
    AlreadyStarted,

    /// The session was exited.
    #[error("session exited")]
    Exited,
}

/// What happened to a submitted answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Logged and scored.
    Accepted {
        /// Was it the right option?
        is_correct: bool,
        /// Points awarded
        points: u32,
    },
    /// The current question already has an answer.
    AlreadyAnswered,
    /// Submitted at or after the deadline.
    Expired,
    /// No question is accepting answers.
    NotActive,
    /// Option index outside the question's options.
    InvalidOption,
}

/// Result of one engine call.
#[derive(Debug, Default)]
pub struct StepResult {
    /// Events to publish, in order
    pub events: Vec<GameEvent>,
    /// Timer commands to execute, in order
    pub timers: Vec<TimerCommand>,
    /// Outcome of `submit_answer`, if that was the call
    pub submit: Option<SubmitOutcome>,
    /// Session completed during this call
    pub completed: bool,
}

/// Per-question idempotency flags.
#[derive(Clone, Copy, Debug, Default)]
struct QuestionGuard {
    answered: bool,
    completing: bool,
}

/// Authoritative state machine for one session.
pub struct GameEngine {
    config: GameConfig,
    session: Option<GameSession>,
    timer: TimerSlot,
    guards: Vec<QuestionGuard>,
    completion_started: bool,
    exited: bool,
    report: Option<CompletionReport>,
    opponents: Option<Box<dyn OpponentGenerator>>,
}

impl GameEngine {
    /// Engine with the given configuration. Opponents are seeded from
    /// `config.seed`, or from the session and player ids when unset.
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            session: None,
            timer: TimerSlot::new(),
            guards: Vec::new(),
            completion_started: false,
            exited: false,
            report: None,
            opponents: None,
        }
    }

    /// Use a custom opponent generator (builder style).
    pub fn with_opponents(mut self, opponents: Box<dyn OpponentGenerator>) -> Self {
        self.opponents = Some(opponents);
        self
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Create the session and either arm the countdown or show the first
    /// question straight away.
    ///
    /// An empty question list is replaced by a single fallback question.
    pub fn start_session(
        &mut self,
        player_id: PlayerId,
        mut questions: Vec<Question>,
        now_ms: u64,
    ) -> Result<StepResult, EngineError> {
        if self.exited {
            return Err(EngineError::Exited);
        }
        if self.session.is_some() {
            return Err(EngineError::AlreadyStarted);
        }

        if questions.is_empty() {
            warn!("No questions supplied for {}, using fallback", player_id.short());
            questions.push(Question::fallback("fallback-0"));
        }

        let session_id = *uuid::Uuid::new_v4().as_bytes();
        let session = GameSession::new(session_id, player_id, questions, self.config.time_per_question_ms);
        info!(
            "Session {} started for {}: {} questions, {}ms each",
            hex::encode(&session_id[..4]),
            player_id.short(),
            session.question_count(),
            session.time_budget_ms
        );

        self.guards = vec![QuestionGuard::default(); session.question_count()];
        self.session = Some(session);

        let mut result = StepResult::default();
        self.push_snapshot(now_ms, &mut result);

        if self.config.countdown_ms > 0 {
            self.timer
                .arm(TimerPurpose::Countdown, now_ms, self.config.countdown_ms, &mut result.timers);
        } else {
            self.begin_playing(now_ms, &mut result);
        }
        Ok(result)
    }

    /// Submit an answer to the current question.
    ///
    /// Never advances the question; the timer does that.
    pub fn submit_answer(&mut self, option_index: usize, now_ms: u64) -> StepResult {
        let mut result = StepResult::default();
        let outcome = self.try_submit(option_index, now_ms, &mut result);
        result.submit = Some(outcome);
        result
    }

    /// Timer expiry reported by the host. Ids that are not the armed
    /// timer are stale and ignored.
    pub fn on_timer_fired(&mut self, timer_id: TimerId, now_ms: u64) -> StepResult {
        let mut result = StepResult::default();
        if self.exited {
            debug!("Timer {:?} fired after exit", timer_id);
            return result;
        }

        let Some(fired) = self.timer.take_if_current(timer_id) else {
            debug!("Ignoring stale timer {:?}", timer_id);
            return result;
        };

        match fired.purpose {
            TimerPurpose::Countdown => self.begin_playing(now_ms, &mut result),
            TimerPurpose::Question(index) => self.complete_into(index, now_ms, &mut result),
        }
        result
    }

    /// Resolve question `index`: log a timeout if unanswered, then advance
    /// or finish. A second call for the same index does nothing.
    pub fn complete_question(&mut self, index: usize, now_ms: u64) -> StepResult {
        let mut result = StepResult::default();
        if !self.exited {
            self.complete_into(index, now_ms, &mut result);
        }
        result
    }

    /// Leave the session. Cancels the armed timer; every later call is a
    /// no-op.
    pub fn exit_session(&mut self) -> StepResult {
        let mut result = StepResult::default();
        if self.exited {
            return result;
        }
        self.exited = true;
        if let Some(cancel) = self.timer.clear() {
            result.timers.push(cancel);
        }
        if let Some(session) = &self.session {
            info!(
                "Session {} exited at question {}/{}",
                hex::encode(&session.session_id[..4]),
                session.current_index + 1,
                session.question_count()
            );
        }
        result
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Visible state at `now_ms`, if a session exists.
    pub fn snapshot(&self, now_ms: u64) -> Option<SessionSnapshot> {
        self.session.as_ref().map(|s| SessionSnapshot::capture(s, now_ms))
    }

    /// The live session.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Completion report, once completed.
    pub fn report(&self) -> Option<&CompletionReport> {
        self.report.as_ref()
    }

    /// Currently armed timer.
    pub fn armed_timer(&self) -> Option<&ArmedTimer> {
        self.timer.current()
    }

    /// Has `exit_session` been called?
    pub fn is_exited(&self) -> bool {
        self.exited
    }

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    fn begin_playing(&mut self, now_ms: u64, result: &mut StepResult) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.advance_phase(SessionPhase::Playing) {
            debug!("Ignoring start of play in phase {:?}", session.phase);
            return;
        }
        self.activate(now_ms, result);
    }

    /// Show the current question and arm its timer.
    fn activate(&mut self, now_ms: u64, result: &mut StepResult) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let index = session.current_index;

        match session.questions.get(index).map(Question::validate) {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                warn!("Question {} malformed ({}), substituting fallback", index, e);
                session.questions[index] = Question::fallback(format!("fallback-{index}"));
            }
            None => {
                warn!("No question at index {}", index);
                return;
            }
        }

        session.question_phase = QuestionPhase::Active;
        session.question_started_at_ms = now_ms;
        let budget = session.time_budget_ms;

        self.timer
            .arm(TimerPurpose::Question(index), now_ms, budget, &mut result.timers);
        debug!("Question {} active, deadline {}", index, now_ms.saturating_add(budget));
        self.push_snapshot(now_ms, result);
    }

    fn try_submit(&mut self, option_index: usize, now_ms: u64, result: &mut StepResult) -> SubmitOutcome {
        if self.exited {
            return SubmitOutcome::NotActive;
        }
        let Some(session) = self.session.as_mut() else {
            return SubmitOutcome::NotActive;
        };
        if session.phase != SessionPhase::Playing || session.question_phase != QuestionPhase::Active {
            return SubmitOutcome::NotActive;
        }

        let index = session.current_index;
        let Some(guard) = self.guards.get_mut(index) else {
            return SubmitOutcome::NotActive;
        };
        if guard.answered || session.current_answered() {
            debug!("Duplicate answer for question {}", index);
            return SubmitOutcome::AlreadyAnswered;
        }

        let budget = session.time_budget_ms;
        let started = session.question_started_at_ms;
        if now_ms >= started.saturating_add(budget) {
            debug!("Answer for question {} arrived after the deadline", index);
            return SubmitOutcome::Expired;
        }

        let Some(question) = session.current_question() else {
            return SubmitOutcome::NotActive;
        };
        if option_index >= question.option_count() {
            return SubmitOutcome::InvalidOption;
        }

        let response_time_ms = now_ms.saturating_sub(started).min(budget);
        let is_correct = question.is_correct(option_index);
        let points = points_for_answer(response_time_ms, budget, question.difficulty, is_correct);
        let answer = Answer {
            question_id: question.id.clone(),
            selected_option_index: Some(option_index),
            is_correct,
            response_time_ms,
            time_budget_ms: budget,
            difficulty: question.difficulty,
            points,
        };

        guard.answered = true;
        session.record_answer(answer);
        debug!(
            "Question {} answered in {}ms: correct={}, +{}",
            index, response_time_ms, is_correct, points
        );

        self.push_snapshot(now_ms, result);
        SubmitOutcome::Accepted { is_correct, points }
    }

    fn complete_into(&mut self, index: usize, now_ms: u64, result: &mut StepResult) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase != SessionPhase::Playing || index != session.current_index {
            debug!("Ignoring completion of question {} (current {})", index, session.current_index);
            return;
        }
        let Some(guard) = self.guards.get_mut(index) else {
            return;
        };
        if guard.completing {
            debug!("Question {} already completing", index);
            return;
        }
        guard.completing = true;

        if let Some(cancel) = self.timer.clear() {
            result.timers.push(cancel);
        }

        if !session.current_answered() {
            if let Some(question) = session.current_question() {
                let timeout = Answer::timeout(question, session.time_budget_ms);
                session.record_answer(timeout);
                guard.answered = true;
                debug!("Question {} timed out", index);
            }
        }

        session.question_phase = QuestionPhase::Resolved;
        let last = session.is_last_question();
        self.push_snapshot(now_ms, result);

        if last {
            self.finish(now_ms, result);
        } else if let Some(session) = self.session.as_mut() {
            session.current_index += 1;
            self.activate(now_ms, result);
        }
    }

    /// Enter `Completed` and run the completion pipeline, once.
    fn finish(&mut self, now_ms: u64, result: &mut StepResult) {
        if self.completion_started {
            return;
        }
        self.completion_started = true;

        if let Some(cancel) = self.timer.clear() {
            result.timers.push(cancel);
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.advance_phase(SessionPhase::Completed);
        let snapshot = SessionSnapshot::capture(session, now_ms);
        result.events.push(GameEvent::StateChanged(snapshot));

        let session = &*session;
        let seed = self.config.seed.unwrap_or_else(|| {
            derive_session_seed(&session.session_id, &session.player_id.to_uuid_string())
        });
        let mut seeded;
        let opponents: &mut dyn OpponentGenerator = match self.opponents.as_mut() {
            Some(custom) => custom.as_mut(),
            None => {
                seeded = SeededOpponents::new(seed);
                &mut seeded
            }
        };

        let input = CompletionInput {
            session,
            prize_pool: self.config.prize_pool,
            opponent_count: self.config.opponent_count,
            contest_id: self.config.contest_id.as_deref(),
            completed_at: Utc::now(),
        };
        let report = run_completion(&input, opponents);

        result.events.push(GameEvent::Completed(report.clone()));
        result.completed = true;
        self.report = Some(report);
    }

    fn push_snapshot(&self, now_ms: u64, result: &mut StepResult) {
        if let Some(session) = &self.session {
            result
                .events
                .push(GameEvent::StateChanged(SessionSnapshot::capture(session, now_ms)));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::completion::CompletionError;
    use crate::game::leaderboard::PlayerEntry;
    use crate::game::opponents::OpponentParams;
    use crate::game::question::Difficulty;
    use proptest::prelude::*;

    fn config() -> GameConfig {
        GameConfig {
            countdown_ms: 0,
            time_per_question_ms: 6000,
            seed: Some(7),
            ..GameConfig::default()
        }
    }

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    format!("q{i}"),
                    format!("Question {i}?"),
                    vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    1,
                    Difficulty::Medium,
                )
            })
            .collect()
    }

    fn last_armed(result: &StepResult) -> Option<TimerId> {
        result.timers.iter().rev().find_map(|c| match c {
            TimerCommand::Arm { id, .. } => Some(*id),
            TimerCommand::Cancel { .. } => None,
        })
    }

    fn started(n: usize) -> (GameEngine, TimerId) {
        let mut engine = GameEngine::new(config());
        let result = engine.start_session(PlayerId::new([1; 16]), questions(n), 0).unwrap();
        let id = last_armed(&result).unwrap();
        (engine, id)
    }

    #[test]
    fn test_correct_answer_scores_without_advancing() {
        let (mut engine, _) = started(3);

        let result = engine.submit_answer(1, 1500);
        assert_eq!(result.submit, Some(SubmitOutcome::Accepted { is_correct: true, points: 150 }));

        let session = engine.session().unwrap();
        assert_eq!(session.current_index, 0);
        assert_eq!(session.score, 150);
        assert_eq!(session.streak, 1);

        let snapshot = result.events[0].snapshot().unwrap();
        assert!(snapshot.answered);
        assert!(snapshot.reveal_answer);
        assert_eq!(snapshot.time_remaining_ms, 4500);
    }

    #[test]
    fn test_timeout_logs_empty_answer() {
        let (mut engine, id) = started(3);
        engine.submit_answer(1, 500);
        engine.on_timer_fired(id, 6000);
        let next = engine.armed_timer().unwrap().id;

        engine.on_timer_fired(next, 12000);

        let session = engine.session().unwrap();
        let answer = &session.answers[1];
        assert_eq!(answer.selected_option_index, None);
        assert!(!answer.is_correct);
        assert_eq!(answer.points, 0);
        assert_eq!(answer.response_time_ms, 6000);
        assert_eq!(session.streak, 0);
        assert_eq!(session.current_index, 2);
    }

    #[test]
    fn test_duplicate_and_late_submissions() {
        let (mut engine, _) = started(2);

        assert_eq!(engine.submit_answer(9, 100).submit, Some(SubmitOutcome::InvalidOption));
        assert_eq!(engine.submit_answer(6000, 100).submit, Some(SubmitOutcome::InvalidOption));
        assert_eq!(engine.submit_answer(0, 6000).submit, Some(SubmitOutcome::Expired));
        assert_eq!(
            engine.submit_answer(0, 5999).submit,
            Some(SubmitOutcome::Accepted { is_correct: false, points: 0 })
        );
        assert_eq!(engine.submit_answer(1, 5999).submit, Some(SubmitOutcome::AlreadyAnswered));
        assert_eq!(engine.session().unwrap().answers.len(), 1);
    }

    #[test]
    fn test_stale_duplicate_expiry_advances_once() {
        let (mut engine, first) = started(3);
        engine.submit_answer(1, 1000);

        let result = engine.on_timer_fired(first, 6000);
        assert_eq!(
            result.timers,
            vec![TimerCommand::Arm { id: engine.armed_timer().unwrap().id, delay_ms: 6000 }]
        );

        // Late duplicate of the same expiry
        let stale = engine.on_timer_fired(first, 6001);
        assert!(stale.events.is_empty());
        assert!(stale.timers.is_empty());

        let session = engine.session().unwrap();
        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.current_index, 1);
    }

    #[test]
    fn test_complete_question_is_idempotent() {
        let (mut engine, _) = started(3);

        let first = engine.complete_question(0, 2000);
        assert!(!first.events.is_empty());
        assert_eq!(engine.session().unwrap().current_index, 1);

        // Same index again: nothing happens
        let second = engine.complete_question(0, 2001);
        assert!(second.events.is_empty());
        assert!(second.timers.is_empty());
        assert_eq!(engine.session().unwrap().current_index, 1);
        assert_eq!(engine.session().unwrap().answers.len(), 1);
    }

    #[test]
    fn test_resolution_reveals_before_advancing() {
        let (mut engine, id) = started(2);
        let result = engine.on_timer_fired(id, 6000);

        let snapshots: Vec<_> = result.events.iter().filter_map(GameEvent::snapshot).collect();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].question_phase, QuestionPhase::Resolved);
        assert!(snapshots[0].reveal_answer);
        assert_eq!(snapshots[0].current_index, 0);
        assert_eq!(snapshots[1].question_phase, QuestionPhase::Active);
        assert!(!snapshots[1].reveal_answer);
        assert_eq!(snapshots[1].current_index, 1);
    }

    #[test]
    fn test_full_session_completes_once() {
        let mut engine = GameEngine::new(GameConfig {
            prize_pool: 900,
            opponent_count: 4,
            ..config()
        });
        let mut result = engine.start_session(PlayerId::new([1; 16]), questions(3), 0).unwrap();
        let mut now = 0;
        let mut completed_events = 0;

        for _ in 0..3 {
            engine.submit_answer(1, now + 1000);
            let id = last_armed(&result).unwrap();
            now += 6000;
            result = engine.on_timer_fired(id, now);
            completed_events += result
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::Completed(_)))
                .count();
        }

        assert!(result.completed);
        assert_eq!(completed_events, 1);
        assert!(engine.armed_timer().is_none());

        let report = engine.report().unwrap();
        assert_eq!(report.score, 450);
        assert_eq!(report.correct_count, 3);
        assert_eq!(report.standings.len(), 5);
        assert!(!report.degraded);
        let total_prizes: u64 = report.standings.iter().map(|p| p.prize).sum();
        assert_eq!(total_prizes, 900);

        // Nothing moves after completion
        assert_eq!(engine.submit_answer(1, now + 1).submit, Some(SubmitOutcome::NotActive));
        assert!(engine.complete_question(2, now + 2).events.is_empty());
        assert_eq!(engine.session().unwrap().phase, SessionPhase::Completed);
    }

    #[test]
    fn test_ten_questions_nine_rivals_third_place() {
        let mut engine = GameEngine::new(GameConfig {
            prize_pool: 900,
            opponent_count: 9,
            ..config()
        });
        let mut result = engine.start_session(PlayerId::new([2; 16]), questions(10), 0).unwrap();
        let mut now = 0;
        for _ in 0..10 {
            // Correct but slow: 110 points each
            engine.submit_answer(1, now + 5000);
            now += 6000;
            result = engine.on_timer_fired(last_armed(&result).unwrap(), now);
        }

        let report = engine.report().unwrap();
        assert_eq!(report.score, 1100);
        assert_eq!(report.standings.len(), 10);
        assert_eq!(report.player_rank, 3);
        assert_eq!(report.prize, 180);
        assert_eq!(report.standings[0].prize, 450);
        assert_eq!(report.standings[1].prize, 270);
        assert!(report.standings[3..].iter().all(|p| p.prize == 0));
    }

    #[test]
    fn test_countdown_then_play() {
        let mut engine = GameEngine::new(GameConfig { countdown_ms: 3000, ..config() });
        let result = engine.start_session(PlayerId::default(), questions(1), 0).unwrap();

        let snapshot = result.events[0].snapshot().unwrap();
        assert_eq!(snapshot.phase, SessionPhase::Waiting);
        assert!(snapshot.question.is_none());
        assert_eq!(engine.armed_timer().map(|t| t.purpose), Some(TimerPurpose::Countdown));

        assert_eq!(engine.submit_answer(1, 100).submit, Some(SubmitOutcome::NotActive));

        let countdown = last_armed(&result).unwrap();
        engine.on_timer_fired(countdown, 3000);
        let session = engine.session().unwrap();
        assert_eq!(session.phase, SessionPhase::Playing);
        assert_eq!(session.question_started_at_ms, 3000);
        assert_eq!(engine.armed_timer().map(|t| t.deadline_ms), Some(9000));
    }

    #[test]
    fn test_empty_question_list_uses_fallback() {
        let mut engine = GameEngine::new(config());
        engine.start_session(PlayerId::default(), Vec::new(), 0).unwrap();

        let session = engine.session().unwrap();
        assert_eq!(session.question_count(), 1);
        assert_eq!(session.questions[0].category, "fallback");
        assert_eq!(
            engine.submit_answer(0, 10).submit,
            Some(SubmitOutcome::Accepted { is_correct: true, points: 120 })
        );
    }

    #[test]
    fn test_malformed_question_replaced_at_activation() {
        let mut bad = questions(2);
        bad[1].correct_option_index = 10;
        let mut engine = GameEngine::new(config());
        let result = engine.start_session(PlayerId::default(), bad, 0).unwrap();

        engine.on_timer_fired(last_armed(&result).unwrap(), 6000);
        let session = engine.session().unwrap();
        assert_eq!(session.current_index, 1);
        assert_eq!(session.questions[1].id, "fallback-1");
        assert!(session.questions[1].is_valid());
    }

    #[test]
    fn test_exit_cancels_timer_and_blocks_calls() {
        let (mut engine, id) = started(2);

        let result = engine.exit_session();
        assert_eq!(result.timers, vec![TimerCommand::Cancel { id }]);
        assert!(engine.is_exited());
        assert!(engine.armed_timer().is_none());

        assert_eq!(engine.submit_answer(1, 10).submit, Some(SubmitOutcome::NotActive));
        assert!(engine.on_timer_fired(id, 6000).events.is_empty());
        assert!(engine.exit_session().timers.is_empty());
        assert_eq!(engine.session().unwrap().answers.len(), 0);
        assert_eq!(
            engine.start_session(PlayerId::default(), questions(1), 0).err(),
            Some(EngineError::Exited)
        );
    }

    #[test]
    fn test_start_twice_is_an_error() {
        let (mut engine, _) = started(1);
        assert_eq!(
            engine.start_session(PlayerId::default(), questions(1), 0).err(),
            Some(EngineError::AlreadyStarted)
        );
    }

    struct BrokenOpponents;

    impl OpponentGenerator for BrokenOpponents {
        fn generate(&mut self, _: &OpponentParams) -> Result<Vec<PlayerEntry>, CompletionError> {
            Err(CompletionError::OpponentGeneration(String::from("offline")))
        }
    }

    #[test]
    fn test_pipeline_failure_still_reports() {
        let mut engine = GameEngine::new(GameConfig { opponent_count: 3, prize_pool: 100, ..config() })
            .with_opponents(Box::new(BrokenOpponents));
        let result = engine.start_session(PlayerId::default(), questions(1), 0).unwrap();
        let done = engine.on_timer_fired(last_armed(&result).unwrap(), 6000);

        assert!(done.completed);
        let report = engine.report().unwrap();
        assert!(report.degraded);
        assert_eq!(report.standings.len(), 1);
        assert_eq!(report.player_rank, 1);
        assert_eq!(report.prize, 50);
    }

    proptest! {
        /// Indices only move forward by one, every question gets exactly
        /// one answer, and completion happens once, whatever the host does.
        #[test]
        fn prop_forward_only_progress(
            plan in prop::collection::vec(
                (prop::option::of((0usize..5, 0u64..7000)), 0usize..3, any::<bool>()),
                1..8,
            )
        ) {
            let n = plan.len();
            let mut engine = GameEngine::new(config());
            let first = engine.start_session(PlayerId::default(), questions(n), 0).unwrap();
            let mut armed = last_armed(&first).unwrap();
            let mut stale = Vec::new();
            let mut now = 0u64;
            let mut seen_index = 0usize;
            let mut completions = 0usize;

            for (answer, stale_fires, double_complete) in plan {
                if let Some((option, delay)) = answer {
                    engine.submit_answer(option, now + delay);
                    engine.submit_answer(option, now + delay);
                }
                for id in stale.iter().take(stale_fires) {
                    let r = engine.on_timer_fired(*id, now + 1);
                    prop_assert!(r.events.is_empty());
                }

                now += 6000;
                let index = engine.session().unwrap().current_index;
                let result = engine.on_timer_fired(armed, now);
                if double_complete {
                    let again = engine.complete_question(index, now);
                    prop_assert!(again.events.is_empty());
                }
                stale.push(armed);

                for event in &result.events {
                    match event {
                        GameEvent::StateChanged(s) => {
                            prop_assert!(s.current_index == seen_index || s.current_index == seen_index + 1);
                            seen_index = s.current_index;
                        }
                        GameEvent::Completed(_) => completions += 1,
                    }
                }
                if let Some(next) = last_armed(&result) {
                    armed = next;
                }
            }

            let session = engine.session().unwrap();
            prop_assert_eq!(session.phase, SessionPhase::Completed);
            prop_assert_eq!(session.answers.len(), n);
            prop_assert_eq!(seen_index, n - 1);
            prop_assert_eq!(completions, 1);
            for (i, answer) in session.answers.iter().enumerate() {
                prop_assert_eq!(&answer.question_id, &format!("q{i}"));
            }
        }
    }
}
