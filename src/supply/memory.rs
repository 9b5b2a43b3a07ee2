//! In-memory question bank and seen-store for tests and the demo binary.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::supply::source::{QuestionBank, SeenQuestionStore};
use crate::supply::SupplyError;

/// Fixed list of raw questions, with an offline switch.
#[derive(Debug, Default)]
pub struct InMemoryQuestionBank {
    questions: RwLock<Vec<Value>>,
    offline: AtomicBool,
}

impl InMemoryQuestionBank {
    /// Bank serving `questions` in order.
    pub fn new(questions: Vec<Value>) -> Self {
        Self {
            questions: RwLock::new(questions),
            offline: AtomicBool::new(false),
        }
    }

    /// Add a raw question.
    pub async fn push(&self, raw: Value) {
        self.questions.write().await.push(raw);
    }

    /// Make fetches fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn fetch_questions(&self, limit: usize) -> Result<Vec<Value>, SupplyError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SupplyError::BankUnavailable(String::from("question bank offline")));
        }
        Ok(self.questions.read().await.iter().take(limit).cloned().collect())
    }
}

/// Seen ids per user.
#[derive(Debug, Default)]
pub struct InMemorySeenStore {
    seen: RwLock<BTreeMap<String, BTreeSet<String>>>,
    failing: AtomicBool,
}

impl InMemorySeenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SupplyError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SupplyError::SeenStoreUnavailable(String::from("seen store offline")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SeenQuestionStore for InMemorySeenStore {
    async fn seen_ids(&self, user_id: &str) -> Result<BTreeSet<String>, SupplyError> {
        self.check()?;
        Ok(self.seen.read().await.get(user_id).cloned().unwrap_or_default())
    }

    async fn record_seen(&self, user_id: &str, ids: &[String]) -> Result<(), SupplyError> {
        self.check()?;
        self.seen
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .extend(ids.iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_bank_limit_and_offline() {
        let bank = InMemoryQuestionBank::new(vec![json!({"id": 1}), json!({"id": 2})]);
        bank.push(json!({"id": 3})).await;

        assert_eq!(bank.fetch_questions(2).await.unwrap().len(), 2);
        assert_eq!(bank.fetch_questions(10).await.unwrap().len(), 3);

        bank.set_offline(true);
        assert!(matches!(bank.fetch_questions(1).await, Err(SupplyError::BankUnavailable(_))));
    }

    #[tokio::test]
    async fn test_seen_is_cumulative_per_user() {
        let store = InMemorySeenStore::new();
        store.record_seen("a", &["q1".into()]).await.unwrap();
        store.record_seen("a", &["q2".into(), "q1".into()]).await.unwrap();
        store.record_seen("b", &["q3".into()]).await.unwrap();

        assert_eq!(store.seen_ids("a").await.unwrap().len(), 2);
        assert_eq!(store.seen_ids("b").await.unwrap().len(), 1);
        assert!(store.seen_ids("c").await.unwrap().is_empty());
    }
}
