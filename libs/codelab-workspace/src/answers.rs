//! Answer Session Store
//!
//! MCQ answer persistence is a strategy chosen by the surrounding page:
//! - practice mode uses `NoopAnswerStore`; MCQ state resets on every problem change
//! - contest mode uses `AttemptAnswerStore`, keyed by problem id for the
//!   lifetime of one contest attempt
//!
//! Once a problem is committed within an attempt its entry is frozen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqOutcome {
    pub is_correct: bool,
    pub selected_option: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub selected_option_index: Option<usize>,
    pub submitted: bool,
    pub result: Option<McqOutcome>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Stored,
    /// An earlier commit exists and was left untouched
    AlreadySubmitted,
}

pub trait AnswerStore: Send + Sync {
    fn get(&self, problem_id: &str) -> Option<AnswerEntry>;

    /// Record a selection without submitting. Ignored once submitted.
    fn set_selection(&self, problem_id: &str, option_index: usize);

    /// Freeze the answer for `problem_id`. Idempotent: a second commit never
    /// changes the stored entry.
    fn commit(&self, problem_id: &str, option_index: usize, result: McqOutcome) -> CommitOutcome;

    fn persists_across_problems(&self) -> bool;
}

/// Practice mode: remembers nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnswerStore;

impl AnswerStore for NoopAnswerStore {
    fn get(&self, _problem_id: &str) -> Option<AnswerEntry> {
        None
    }

    fn set_selection(&self, _problem_id: &str, _option_index: usize) {}

    fn commit(&self, _problem_id: &str, _option_index: usize, _result: McqOutcome) -> CommitOutcome {
        CommitOutcome::Stored
    }

    fn persists_across_problems(&self) -> bool {
        false
    }
}

/// Contest mode: one map per attempt. Clones share the same entries, so the
/// contest page keeps a handle while each mounted workspace holds another.
#[derive(Debug, Clone, Default)]
pub struct AttemptAnswerStore {
    entries: Arc<Mutex<HashMap<String, AnswerEntry>>>,
}

impl AttemptAnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, AnswerEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn submitted_count(&self) -> usize {
        self.entries().values().filter(|e| e.submitted).count()
    }
}

impl AnswerStore for AttemptAnswerStore {
    fn get(&self, problem_id: &str) -> Option<AnswerEntry> {
        self.entries().get(problem_id).cloned()
    }

    fn set_selection(&self, problem_id: &str, option_index: usize) {
        let mut entries = self.entries();
        let entry = entries.entry(problem_id.to_string()).or_default();
        if entry.submitted {
            debug!(problem_id, "Selection ignored, answer already submitted");
            return;
        }
        entry.selected_option_index = Some(option_index);
    }

    fn commit(&self, problem_id: &str, option_index: usize, result: McqOutcome) -> CommitOutcome {
        let mut entries = self.entries();
        let entry = entries.entry(problem_id.to_string()).or_default();
        if entry.submitted {
            debug!(problem_id, "Commit ignored, answer already submitted");
            return CommitOutcome::AlreadySubmitted;
        }

        *entry = AnswerEntry {
            selected_option_index: Some(option_index),
            submitted: true,
            result: Some(result),
            submitted_at: Some(Utc::now()),
        };
        CommitOutcome::Stored
    }

    fn persists_across_problems(&self) -> bool {
        true
    }
}
