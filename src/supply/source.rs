//! Question Supply
//!
//! Picks exactly `count` questions for a session. Preference order:
//! unseen bank questions, then already-seen ones, then duplicates of
//! either under derived ids, and the emergency set only when the bank
//! yields nothing playable.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::rng::DeterministicRng;
use crate::game::question::Question;
use crate::supply::emergency::emergency_questions;
use crate::supply::raw::normalize_all;
use crate::supply::SupplyError;

/// How many raw questions to request per question needed.
pub const FETCH_FACTOR: usize = 3;

/// Remote source of raw question JSON.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Up to `limit` raw questions.
    async fn fetch_questions(&self, limit: usize) -> Result<Vec<Value>, SupplyError>;
}

/// Per-user record of question ids already shown.
#[async_trait]
pub trait SeenQuestionStore: Send + Sync {
    /// Ids this user has seen in any earlier session.
    async fn seen_ids(&self, user_id: &str) -> Result<BTreeSet<String>, SupplyError>;
    /// Add ids to the user's seen set.
    async fn record_seen(&self, user_id: &str, ids: &[String]) -> Result<(), SupplyError>;
}

/// Question selection with backfill.
pub struct QuestionSupply {
    bank: Arc<dyn QuestionBank>,
    seen: Arc<dyn SeenQuestionStore>,
    rng: Mutex<DeterministicRng>,
    allow_emergency: bool,
}

impl QuestionSupply {
    /// Supply over the given backends, shuffling with `seed`.
    pub fn new(bank: Arc<dyn QuestionBank>, seen: Arc<dyn SeenQuestionStore>, seed: u64) -> Self {
        Self {
            bank,
            seen,
            rng: Mutex::new(DeterministicRng::new(seed)),
            allow_emergency: true,
        }
    }

    /// Enable or disable the emergency set (builder style).
    pub fn with_emergency(mut self, allow: bool) -> Self {
        self.allow_emergency = allow;
        self
    }

    /// Exactly `count` questions with unique ids, or
    /// [`SupplyError::NoQuestionsAvailable`] when nothing can be produced.
    #[instrument(skip(self))]
    pub async fn get_questions(&self, count: usize, user_id: &str) -> Result<Vec<Question>, SupplyError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let raws = match self.bank.fetch_questions(count.saturating_mul(FETCH_FACTOR)).await {
            Ok(raws) => raws,
            Err(e) => {
                warn!("Question bank failed: {}", e);
                Vec::new()
            }
        };
        let batch = normalize_all(&raws);
        let mut unique = BTreeSet::new();
        let playable: Vec<Question> = batch
            .questions
            .into_iter()
            .filter(|q| unique.insert(q.id.clone()))
            .collect();

        let seen = match self.seen.seen_ids(user_id).await {
            Ok(seen) => seen,
            Err(e) => {
                warn!("Seen-question lookup failed, treating all as unseen: {}", e);
                BTreeSet::new()
            }
        };

        let (mut fresh, mut repeat): (Vec<Question>, Vec<Question>) =
            playable.into_iter().partition(|q| !seen.contains(&q.id));
        self.shuffle(&mut fresh);
        self.shuffle(&mut repeat);
        debug!(
            "{} playable ({} unseen, {} seen), {} rejected",
            fresh.len() + repeat.len(),
            fresh.len(),
            repeat.len(),
            batch.rejected
        );

        let mut pool = fresh;
        pool.extend(repeat);
        let from_bank = !pool.is_empty();

        if !from_bank {
            if !self.allow_emergency {
                return Err(SupplyError::NoQuestionsAvailable);
            }
            warn!("No playable bank questions, using emergency set");
            pool = emergency_questions();
            self.shuffle(&mut pool);
        }

        let selected = fill(&pool, count);

        if from_bank {
            let shown: Vec<String> = pool.iter().take(count).map(|q| q.id.clone()).collect();
            if let Err(e) = self.seen.record_seen(user_id, &shown).await {
                warn!("Failed to record seen questions: {}", e);
            }
        }

        info!(
            "Supplied {} questions ({} distinct){}",
            selected.len(),
            pool.len().min(count),
            if from_bank { "" } else { " from emergency set" }
        );
        Ok(selected)
    }

    fn shuffle(&self, questions: &mut [Question]) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.shuffle(questions);
    }
}

/// Take `count` questions from `pool` in order, cycling with derived ids
/// (`"{id}#{n}"`) once the pool runs out.
fn fill(pool: &[Question], count: usize) -> Vec<Question> {
    if pool.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|i| {
            let round = i / pool.len();
            let mut question = pool[i % pool.len()].clone();
            if round > 0 {
                question.id = format!("{}#{}", question.id, round);
            }
            question
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supply::memory::{InMemoryQuestionBank, InMemorySeenStore};
    use proptest::prelude::*;
    use serde_json::json;

    fn raw(id: usize) -> Value {
        json!({
            "id": format!("b{id}"),
            "question": format!("Question {id}?"),
            "options": ["a", "b", "c"],
            "correct_option_index": 1
        })
    }

    fn supply(raws: Vec<Value>) -> (QuestionSupply, Arc<InMemoryQuestionBank>, Arc<InMemorySeenStore>) {
        let bank = Arc::new(InMemoryQuestionBank::new(raws));
        let seen = Arc::new(InMemorySeenStore::new());
        (QuestionSupply::new(bank.clone(), seen.clone(), 99), bank, seen)
    }

    fn ids(questions: &[Question]) -> Vec<String> {
        questions.iter().map(|q| q.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_unseen_first() {
        let (supply, _, seen) = supply((0..6).map(raw).collect());
        seen.record_seen("u", &["b0".into(), "b1".into(), "b2".into()]).await.unwrap();

        let questions = supply.get_questions(3, "u").await.unwrap();
        let mut got = ids(&questions);
        got.sort();
        assert_eq!(got, vec!["b3", "b4", "b5"]);

        // All six are now seen
        assert_eq!(seen.seen_ids("u").await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_backfill_with_seen_then_duplicates() {
        let (supply, _, seen) = supply((0..3).map(raw).collect());
        seen.record_seen("u", &["b0".into()]).await.unwrap();

        let questions = supply.get_questions(7, "u").await.unwrap();
        assert_eq!(questions.len(), 7);

        let got = ids(&questions);
        let unique: BTreeSet<_> = got.iter().collect();
        assert_eq!(unique.len(), 7);
        // Seen question comes after the two unseen ones
        assert_eq!(got[2], "b0");
        assert!(got.iter().filter(|id| id.contains('#')).count() == 4);
    }

    #[tokio::test]
    async fn test_rejected_and_duplicate_ids_skipped() {
        let (supply, _, _) = supply(vec![
            raw(1),
            raw(1),
            json!({"question": "broken", "options": []}),
            raw(2),
        ]);
        let questions = supply.get_questions(2, "u").await.unwrap();
        let mut got = ids(&questions);
        got.sort();
        assert_eq!(got, vec!["b1", "b2"]);
    }

    #[tokio::test]
    async fn test_emergency_when_bank_offline() {
        let (supply, bank, seen) = supply((0..5).map(raw).collect());
        bank.set_offline(true);

        let questions = supply.get_questions(4, "u").await.unwrap();
        assert_eq!(questions.len(), 4);
        assert!(questions.iter().all(|q| q.id.starts_with("emergency-")));
        // Emergency questions are not recorded as seen
        assert!(seen.seen_ids("u").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_questions_without_emergency() {
        let bank = Arc::new(InMemoryQuestionBank::new(Vec::new()));
        let seen = Arc::new(InMemorySeenStore::new());
        let supply = QuestionSupply::new(bank, seen, 1).with_emergency(false);

        assert_eq!(supply.get_questions(3, "u").await, Err(SupplyError::NoQuestionsAvailable));
        assert_eq!(supply.get_questions(0, "u").await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_seen_store_failure_is_not_fatal() {
        let (supply, _, seen) = supply((0..4).map(raw).collect());
        seen.set_failing(true);

        let questions = supply.get_questions(4, "u").await.unwrap();
        assert_eq!(questions.len(), 4);
    }

    proptest! {
        #[test]
        fn prop_supply_always_sufficient(
            bank_size in 0usize..8,
            broken in 0usize..4,
            seen_count in 0usize..8,
            count in 1usize..20,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let questions = runtime.block_on(async {
                let mut raws: Vec<Value> = (0..bank_size).map(raw).collect();
                raws.extend((0..broken).map(|_| json!({"question": "x"})));
                let (supply, _, seen) = supply(raws);
                let seen_ids: Vec<String> = (0..seen_count).map(|i| format!("b{i}")).collect();
                seen.record_seen("u", &seen_ids).await.unwrap();
                supply.get_questions(count, "u").await.unwrap()
            });

            prop_assert_eq!(questions.len(), count);
            let unique: BTreeSet<_> = questions.iter().map(|q| q.id.clone()).collect();
            prop_assert_eq!(unique.len(), count);
            prop_assert!(questions.iter().all(Question::is_valid));
        }
    }
}
