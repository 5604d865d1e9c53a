//! Submission and test-execution orchestration for the problem-solving workspace.
//!
//! Layering, leaf first:
//! - `test_cases` / `codec`: editable cases and the ` | ` wire format
//! - `request`: run and submit request construction
//! - `reconciler`: backend results to UI-facing records
//! - `answers`: per-attempt MCQ persistence
//! - `controller`: the workspace state machine tying it together

pub mod answers;
pub mod codec;
pub mod controller;
pub mod error;
pub mod reconciler;
pub mod repository;
pub mod request;
pub mod service;
pub mod test_cases;

#[cfg(test)]
mod service_tests;

pub use answers::{AnswerEntry, AnswerStore, AttemptAnswerStore, McqOutcome, NoopAnswerStore};
pub use controller::{McqState, Notice, NoticeLevel, ResultTab, RunState, SubmitState, Workspace, WorkspaceMode};
pub use error::{CaseEditError, RepositoryError, ServiceError, ValidationError};
pub use reconciler::{ResultRecord, ResultView, RunSummary, SubmitSummary};
pub use repository::{ContestRepository, ContestSummary, InMemoryRepository, ProblemRef, ProblemRepository, ProblemStatus, ProblemStatusSource};
pub use service::{ExecutionService, HttpExecutionService};
pub use test_cases::{CaseField, TestCase, TestCaseSet};
