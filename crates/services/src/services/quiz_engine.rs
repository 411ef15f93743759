//! Quiz traversal engine: resumable linear walk over the item catalog with
//! write-through progress persistence.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use ts_rs::TS;

use super::quiz_catalog::{self, QuestionType, QuizItem};

/// Storage key for the serialized answer map
pub const ANSWERS_KEY: &str = "quiz_answers";
/// Storage key for the current step index
pub const STEP_KEY: &str = "quiz_step";

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("unknown question id: {0}")]
    UnknownQuestion(String),
}

/// A single stored answer; sliders produce numbers, everything else strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            AnswerValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            AnswerValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// Durable key-value storage for quiz progress, keyed by session.
///
/// The production implementation is in-memory; tests inject their own.
pub trait ProgressStore: Send + Sync {
    fn load(&self, session: &str, key: &str) -> Option<String>;
    fn save(&self, session: &str, key: &str, value: &str);
    fn clear(&self, session: &str);
}

impl<S: ProgressStore + ?Sized> ProgressStore for Arc<S> {
    fn load(&self, session: &str, key: &str) -> Option<String> {
        (**self).load(session, key)
    }

    fn save(&self, session: &str, key: &str, value: &str) {
        (**self).save(session, key, value)
    }

    fn clear(&self, session: &str) {
        (**self).clear(session)
    }
}

impl<S: ProgressStore + ?Sized> ProgressStore for &S {
    fn load(&self, session: &str, key: &str) -> Option<String> {
        (**self).load(session, key)
    }

    fn save(&self, session: &str, key: &str, value: &str) {
        (**self).save(session, key, value)
    }

    fn clear(&self, session: &str) {
        (**self).clear(session)
    }
}

/// Process-wide in-memory progress store
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    entries: DashMap<(String, String), String>,
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, session: &str, key: &str) -> Option<String> {
        self.entries
            .get(&(session.to_string(), key.to_string()))
            .map(|entry| entry.value().clone())
    }

    fn save(&self, session: &str, key: &str, value: &str) {
        self.entries
            .insert((session.to_string(), key.to_string()), value.to_string());
    }

    fn clear(&self, session: &str) {
        self.entries.retain(|(s, _), _| s != session);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraversalState {
    pub current_index: usize,
    pub answers: AnswerMap,
}

/// Outcome of an `advance()` call
#[derive(Debug)]
pub enum AdvanceOutcome {
    /// The current item's validity gate failed; position unchanged
    Blocked,
    /// Moved forward to the given index
    Moved(usize),
    /// The final item was passed: the session is complete, progress is
    /// cleared, and the full answer set is handed to the caller exactly once
    ReadyToSubmit(AnswerMap),
}

/// Drives a user through the fixed item sequence, gating advancement on a
/// per-item validity predicate and persisting progress after every mutation.
pub struct QuizEngine<S> {
    store: S,
    session: String,
    items: &'static [QuizItem],
    state: TraversalState,
    submitted: bool,
}

impl<S: ProgressStore> QuizEngine<S> {
    /// Restore a session from storage, falling back silently to a fresh
    /// session when stored data is absent or malformed.
    pub fn restore(store: S, session: &str) -> Self {
        Self::with_items(quiz_catalog::quiz_items(), store, session)
    }

    pub fn with_items(items: &'static [QuizItem], store: S, session: &str) -> Self {
        let answers = store
            .load(session, ANSWERS_KEY)
            .and_then(|raw| match serde_json::from_str::<AnswerMap>(&raw) {
                Ok(map) => Some(map),
                Err(e) => {
                    debug!(session, error = %e, "discarding malformed stored answers");
                    None
                }
            })
            .unwrap_or_default();

        let current_index = store
            .load(session, STEP_KEY)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|index| *index < items.len())
            .unwrap_or(0);

        Self {
            store,
            session: session.to_string(),
            items,
            state: TraversalState {
                current_index,
                answers,
            },
            submitted: false,
        }
    }

    pub fn state(&self) -> &TraversalState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn current_item(&self) -> &'static QuizItem {
        &self.items[self.state.current_index]
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Percent of the traversal completed, counting the current item
    pub fn progress_percent(&self) -> f64 {
        (self.state.current_index + 1) as f64 / self.items.len() as f64 * 100.0
    }

    /// Number of answered questions; differs from the index because info
    /// slides produce no answers
    pub fn answered_count(&self) -> usize {
        self.state.answers.len()
    }

    /// Whether the current item's validity gate passes
    pub fn can_advance(&self) -> bool {
        can_advance(self.current_item(), &self.state.answers)
    }

    /// Upsert an answer and persist the full state write-through
    pub fn answer(&mut self, id: &str, value: AnswerValue) -> Result<(), QuizError> {
        if !self.items.iter().any(|item| {
            item.as_question()
                .is_some_and(|question| question.id == id)
        }) {
            return Err(QuizError::UnknownQuestion(id.to_string()));
        }
        self.state.answers.insert(id.to_string(), value);
        self.persist();
        Ok(())
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.submitted || !self.can_advance() {
            return AdvanceOutcome::Blocked;
        }

        let last_index = self.items.len() - 1;
        if self.state.current_index >= last_index {
            // One-shot: the flag and the cleared store together guarantee a
            // single submission per session even on rapid repeated calls.
            self.submitted = true;
            let answers = std::mem::take(&mut self.state.answers);
            self.store.clear(&self.session);
            return AdvanceOutcome::ReadyToSubmit(answers);
        }

        self.state.current_index += 1;
        self.persist();
        AdvanceOutcome::Moved(self.state.current_index)
    }

    pub fn retreat(&mut self) {
        if self.state.current_index > 0 {
            self.state.current_index -= 1;
            self.persist();
        }
    }

    fn persist(&self) {
        match serde_json::to_string(&self.state.answers) {
            Ok(json) => self.store.save(&self.session, ANSWERS_KEY, &json),
            Err(e) => debug!(session = %self.session, error = %e, "failed to serialize answers"),
        }
        self.store
            .save(&self.session, STEP_KEY, &self.state.current_index.to_string());
    }
}

/// Validity gate for a single item: info slides always pass; non-required
/// questions always pass; required text/email need a non-empty trimmed
/// string; other required questions need any stored value.
pub fn can_advance(item: &QuizItem, answers: &AnswerMap) -> bool {
    let Some(question) = item.as_question() else {
        return true;
    };
    if !question.required {
        return true;
    }
    match answers.get(&question.id) {
        None => false,
        Some(value) => match question.question_type {
            QuestionType::Text | QuestionType::Email => value
                .as_text()
                .is_some_and(|text| !text.trim().is_empty()),
            QuestionType::Slider | QuestionType::Buttons => true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::quiz_catalog::quiz_items;

    fn sample_answer(question: &crate::services::quiz_catalog::Question) -> AnswerValue {
        match question.question_type {
            QuestionType::Slider => {
                let min = question.constraints.min.unwrap_or(1.0);
                let max = question.constraints.max.unwrap_or(10.0);
                AnswerValue::Number(((min + max) / 2.0).round())
            }
            QuestionType::Buttons => {
                AnswerValue::Text(question.constraints.options[0].value.clone())
            }
            QuestionType::Text => AnswerValue::Text("Jan".to_string()),
            QuestionType::Email => AnswerValue::Text("jan@example.com".to_string()),
        }
    }

    #[test]
    fn fresh_session_starts_at_zero() {
        let store = MemoryProgressStore::default();
        let engine = QuizEngine::restore(&store, "s1");
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.answered_count(), 0);
    }

    #[test]
    fn malformed_stored_state_falls_back_silently() {
        let store = MemoryProgressStore::default();
        store.save("s1", ANSWERS_KEY, "{not valid json");
        store.save("s1", STEP_KEY, "way-out");
        let engine = QuizEngine::restore(&store, "s1");
        assert_eq!(engine.current_index(), 0);
        assert!(engine.state().answers.is_empty());
    }

    #[test]
    fn out_of_range_stored_index_falls_back_to_zero() {
        let store = MemoryProgressStore::default();
        store.save("s1", STEP_KEY, "9999");
        let engine = QuizEngine::restore(&store, "s1");
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn restore_after_save_yields_identical_state() {
        let store = MemoryProgressStore::default();
        {
            let mut engine = QuizEngine::restore(&store, "s1");
            engine.advance(); // intro slide
            engine
                .answer("first_name", AnswerValue::Text("Jan".to_string()))
                .unwrap();
            engine.advance();
        }
        let first = QuizEngine::restore(&store, "s1").state().clone();
        let second = QuizEngine::restore(&store, "s1").state().clone();
        assert_eq!(first, second);
        assert_eq!(first.current_index, 2);
        assert_eq!(
            first.answers.get("first_name"),
            Some(&AnswerValue::Text("Jan".to_string()))
        );
    }

    #[test]
    fn required_text_question_gates_until_non_empty() {
        let store = MemoryProgressStore::default();
        let mut engine = QuizEngine::restore(&store, "s1");
        engine.advance(); // intro slide always passes
        assert!(!engine.can_advance(), "first_name must gate when unanswered");

        engine
            .answer("first_name", AnswerValue::Text("   ".to_string()))
            .unwrap();
        assert!(!engine.can_advance(), "whitespace-only must not pass");

        engine
            .answer("first_name", AnswerValue::Text("Jan".to_string()))
            .unwrap();
        assert!(engine.can_advance());
    }

    #[test]
    fn required_slider_gates_until_any_value_present() {
        let store = MemoryProgressStore::default();
        let mut engine = QuizEngine::restore(&store, "s1");
        // walk to the age slider
        engine.advance();
        engine
            .answer("first_name", AnswerValue::Text("Jan".to_string()))
            .unwrap();
        engine.advance();
        engine
            .answer("email", AnswerValue::Text("jan@example.com".to_string()))
            .unwrap();
        engine.advance();
        assert_eq!(engine.current_item().id(), "age");
        assert!(!engine.can_advance());

        engine.answer("age", AnswerValue::Number(34.0)).unwrap();
        assert!(engine.can_advance());
    }

    #[test]
    fn unknown_question_id_is_rejected() {
        let store = MemoryProgressStore::default();
        let mut engine = QuizEngine::restore(&store, "s1");
        let err = engine
            .answer("shoe_size", AnswerValue::Number(44.0))
            .unwrap_err();
        assert!(matches!(err, QuizError::UnknownQuestion(_)));
    }

    #[test]
    fn retreat_at_zero_is_a_no_op() {
        let store = MemoryProgressStore::default();
        let mut engine = QuizEngine::restore(&store, "s1");
        engine.retreat();
        assert_eq!(engine.current_index(), 0);
        engine.advance();
        engine.retreat();
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn full_walkthrough_submits_exactly_once() {
        let store = MemoryProgressStore::default();
        let mut engine = QuizEngine::restore(&store, "s1");
        let mut submissions = 0;

        for _ in 0..quiz_items().len() + 3 {
            if let Some(question) = engine.current_item().as_question() {
                engine
                    .answer(&question.id.clone(), sample_answer(question))
                    .unwrap();
            }
            match engine.advance() {
                AdvanceOutcome::ReadyToSubmit(answers) => {
                    submissions += 1;
                    assert!(answers.contains_key("age"));
                    assert!(answers.contains_key("email"));
                }
                AdvanceOutcome::Moved(index) => {
                    assert!(index < quiz_items().len());
                }
                AdvanceOutcome::Blocked => {}
            }
        }

        assert_eq!(submissions, 1, "the final advance must submit exactly once");
        // progress is cleared: a fresh restore starts over instead of resubmitting
        let fresh = QuizEngine::restore(&store, "s1");
        assert_eq!(fresh.current_index(), 0);
        assert_eq!(fresh.answered_count(), 0);
    }

    #[test]
    fn answered_count_tracks_answers_not_position() {
        let store = MemoryProgressStore::default();
        let mut engine = QuizEngine::restore(&store, "s1");
        engine.advance(); // past the intro slide
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.answered_count(), 0);

        engine
            .answer("first_name", AnswerValue::Text("Jan".to_string()))
            .unwrap();
        assert_eq!(engine.answered_count(), 1);
    }

    #[test]
    fn progress_percent_counts_current_item() {
        let store = MemoryProgressStore::default();
        let engine = QuizEngine::restore(&store, "s1");
        let expected = 1.0 / quiz_items().len() as f64 * 100.0;
        assert!((engine.progress_percent() - expected).abs() < 1e-9);
    }
}
