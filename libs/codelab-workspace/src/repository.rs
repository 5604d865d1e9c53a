//! Read-only collaborators the workspace consumes: problems, contests, and the
//! solved/attempted listing that gets refreshed after a submission.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use codelab_common::types::ProblemSchema;
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStatus {
    #[default]
    Unattempted,
    Attempted,
    Solved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRef {
    pub id: String,
    #[serde(default)]
    pub status: ProblemStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestSummary {
    pub id: String,
    pub problems: Vec<ProblemRef>,
    pub is_registered: bool,
}

#[async_trait]
pub trait ProblemRepository: Send + Sync {
    async fn get_problem(&self, id: &str) -> Result<ProblemSchema, RepositoryError>;
}

#[async_trait]
pub trait ContestRepository: Send + Sync {
    async fn get_contest(&self, id: &str) -> Result<ContestSummary, RepositoryError>;
}

/// Source of the solved/attempted markers shown next to each problem
#[async_trait]
pub trait ProblemStatusSource: Send + Sync {
    async fn refresh_status(&self, problem_id: &str) -> Result<ProblemStatus, RepositoryError>;
}

#[derive(Debug, Default)]
struct Inner {
    problems: HashMap<String, ProblemSchema>,
    contests: HashMap<String, ContestSummary>,
    statuses: HashMap<String, ProblemStatus>,
}

/// In-process repository backing the CLI and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_problem(&self, problem: ProblemSchema) {
        self.inner().problems.insert(problem.id.clone(), problem);
    }

    pub fn insert_contest(&self, contest: ContestSummary) {
        self.inner().contests.insert(contest.id.clone(), contest);
    }

    pub fn set_status(&self, problem_id: &str, status: ProblemStatus) {
        self.inner().statuses.insert(problem_id.to_string(), status);
    }

    pub fn status(&self, problem_id: &str) -> ProblemStatus {
        self.inner().statuses.get(problem_id).copied().unwrap_or_default()
    }

    pub fn problem_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner().problems.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl ProblemRepository for InMemoryRepository {
    async fn get_problem(&self, id: &str) -> Result<ProblemSchema, RepositoryError> {
        self.inner()
            .problems
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::ProblemNotFound(id.to_string()))
    }
}

#[async_trait]
impl ContestRepository for InMemoryRepository {
    async fn get_contest(&self, id: &str) -> Result<ContestSummary, RepositoryError> {
        let inner = self.inner();
        let mut contest = inner
            .contests
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::ContestNotFound(id.to_string()))?;

        for problem in &mut contest.problems {
            if let Some(status) = inner.statuses.get(&problem.id) {
                problem.status = *status;
            }
        }
        Ok(contest)
    }
}

#[async_trait]
impl ProblemStatusSource for InMemoryRepository {
    /// Reports the recorded status, promoting an untouched problem to attempted
    async fn refresh_status(&self, problem_id: &str) -> Result<ProblemStatus, RepositoryError> {
        let mut inner = self.inner();
        let status = inner.statuses.entry(problem_id.to_string()).or_default();
        if *status == ProblemStatus::Unattempted {
            *status = ProblemStatus::Attempted;
        }
        Ok(*status)
    }
}
