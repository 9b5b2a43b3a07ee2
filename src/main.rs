//! Quiz Contest Demo
//!
//! Runs one simulated session end to end: question supply from an
//! in-memory bank, the tokio session driver, a bot player answering over
//! the host command channel, and result persistence.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_contest::{
    VERSION,
    config::GameConfig,
    core::{clock::TokioClock, rng::DeterministicRng},
    game::{
        engine::GameEngine,
        events::GameEvent,
        state::{PlayerId, QuestionPhase, SessionPhase},
    },
    persistence::{sync_stats, InMemoryResultStore, InMemoryStatsCache},
    runtime::SessionDriver,
    supply::{InMemoryQuestionBank, InMemorySeenStore, QuestionSupply},
};

/// Chance in percent that the bot picks the right option.
const BOT_ACCURACY_PERCENT: u32 = 70;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Quiz Contest Engine v{}", VERSION);

    let config = GameConfig::from_env().context("invalid QUIZ_* environment")?;
    info!(
        "Config: {} questions, {}ms each, {}ms countdown, pool {}, {} opponents",
        config.question_count,
        config.time_per_question_ms,
        config.countdown_ms,
        config.prize_pool,
        config.opponent_count
    );

    let seed = config.seed.unwrap_or(12345);
    let bank = Arc::new(InMemoryQuestionBank::new(demo_bank()));
    let seen = Arc::new(InMemorySeenStore::new());
    let supply = QuestionSupply::new(bank, seen, seed).with_emergency(config.allow_emergency_questions);

    let player = PlayerId::random();
    let user_id = player.to_uuid_string();
    let questions = supply
        .get_questions(config.question_count, &user_id)
        .await
        .context("no questions to play")?;

    let cache = Arc::new(InMemoryStatsCache::new());
    let store = Arc::new(InMemoryResultStore::new());
    let budget = config.time_per_question_ms;

    let handle = SessionDriver::new(GameEngine::new(config), Arc::new(TokioClock::new()))
        .with_persistence(cache.clone(), store.clone())
        .spawn();
    let mut events = handle.subscribe();
    handle.start(player, questions).await?;

    let mut bot = DeterministicRng::new(seed ^ 0xB07);
    loop {
        match events.recv().await {
            Ok(GameEvent::StateChanged(snapshot)) => {
                let playable = snapshot.phase == SessionPhase::Playing
                    && snapshot.question_phase == QuestionPhase::Active
                    && !snapshot.answered;
                let Some(question) = snapshot.question.filter(|_| playable) else {
                    continue;
                };

                let think_ms = budget * u64::from(bot.next_u32_range(20, 90)) / 100;
                tokio::time::sleep(Duration::from_millis(think_ms)).await;

                let option = if bot.next_int(100) < BOT_ACCURACY_PERCENT {
                    question.correct_option_index
                } else {
                    bot.next_int(question.option_count() as u32) as usize
                };
                let outcome = handle.submit(option).await?;
                info!(
                    "Q{}/{} [{}] answered {} after {}ms: {:?}",
                    snapshot.current_index + 1,
                    snapshot.question_count,
                    question.id,
                    option,
                    think_ms,
                    outcome
                );
            }
            Ok(GameEvent::Completed(_)) => break,
            Err(RecvError::Lagged(missed)) => warn!("Event stream lagged, {} missed", missed),
            Err(RecvError::Closed) => break,
        }
    }

    let report = handle.join().await?.context("session ended without a result")?;
    info!(
        "Final: score {}, {}/{} correct, rank {}, prize {}",
        report.score, report.correct_count, report.question_count, report.player_rank, report.prize
    );
    for entry in &report.standings {
        info!(
            "  #{} {:<12} {:>5} pts  {:>6}ms  prize {}",
            entry.rank, entry.name, entry.score, entry.total_response_time_ms, entry.prize
        );
    }
    for achievement in &report.achievements {
        info!("Achievement: {}", achievement.title());
    }

    let stats = sync_stats(cache.as_ref(), store.as_ref(), &user_id).await?;
    info!(
        "Stats for {}: {} games, {} earned, best {}",
        player.short(),
        stats.games_played,
        stats.total_earnings,
        stats.highest_score
    );

    Ok(())
}

/// Raw questions in the shapes real banks return, one of them broken.
fn demo_bank() -> Vec<Value> {
    vec![
        json!({
            "id": "geo-1",
            "question_en": "What is the capital of Japan?",
            "question_ar": "ما هي عاصمة اليابان؟",
            "options_en": ["Osaka", "Tokyo", "Kyoto", "Nagoya"],
            "options_ar": ["أوساكا", "طوكيو", "كيوتو", "ناغويا"],
            "correct_option_index": 1,
            "category": "geography",
            "difficulty": "easy"
        }),
        json!({
            "id": "sci-1",
            "question": "What is the chemical symbol for gold?",
            "options": "[\"Ag\", \"Au\", \"Gd\", \"Go\"]",
            "correct_answer": "Au",
            "category": "science",
            "difficulty": "Medium"
        }),
        json!({
            "id": "math-1",
            "text": {"en": "What is 15% of 200?", "ar": "ما هو ١٥٪ من ٢٠٠؟"},
            "options": [
                {"text": {"en": "15", "ar": "١٥"}},
                {"text": {"en": "30", "ar": "٣٠"}, "is_correct": true},
                {"text": {"en": "45", "ar": "٤٥"}}
            ],
            "category": "math",
            "difficulty": "hard"
        }),
        json!({
            "id": "hist-1",
            "question": "In which year did the first Moon landing happen?",
            "options": ["1965", "1969", "1972", "1959"],
            "correct_option_index": 1,
            "category": "history",
            "difficulty": "expert"
        }),
        json!({
            "id": "sport-1",
            "question": "How many players are on a football team on the pitch?",
            "choices": ["9", "10", "11", "12"],
            "correct_option_index": "2",
            "category": "sports"
        }),
        json!({
            "id": "broken-1",
            "question": "This one has a single option",
            "options": ["alone"]
        }),
        json!({
            "id": "lit-1",
            "question": "Who wrote 'One Thousand and One Nights'?",
            "options": [
                {"text": "Unknown / collective", "is_correct": true},
                {"text": "Naguib Mahfouz"},
                {"text": "Ibn Khaldun"}
            ],
            "category": "literature",
            "difficulty": "medium"
        }),
    ]
}
