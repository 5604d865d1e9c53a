use std::time::Duration;

use thiserror::Error;

/// Rejected locally before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please write some code first")]
    EmptyCode,
    #[error("Add at least one test case before running")]
    NoTestCases,
    #[error("Select an option before submitting")]
    NoOptionSelected,
    #[error("Option {0} does not exist")]
    OptionOutOfRange(usize),
    #[error("This question has already been submitted")]
    AlreadySubmitted,
    #[error("A submission is already in progress")]
    SubmitInProgress,
    #[error("This action needs a coding problem")]
    NotCodingProblem,
    #[error("This action needs a multiple-choice problem")]
    NotMcqProblem,
    #[error("No problem is loaded")]
    NoProblemLoaded,
}

/// Why a test case edit was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaseEditError {
    #[error("teacher-provided test cases cannot be edited")]
    NotPermitted,
    #[error("no test case at index {0}")]
    CaseOutOfRange(usize),
    #[error("no field at index {0}")]
    FieldOutOfRange(usize),
}

/// Failure talking to the execution backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request never produced a usable response
    #[error("{0}")]
    Transport(String),
    /// The backend answered but reported failure
    #[error("{0}")]
    Api(String),
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ServiceError {
    /// Status string carried by the synthetic result record for this failure
    pub fn result_status(&self) -> &'static str {
        match self {
            ServiceError::Transport(_) => "Execution Error",
            ServiceError::Api(_) => "API Error",
            ServiceError::Timeout(_) => "Timeout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("problem not found: {0}")]
    ProblemNotFound(String),
    #[error("contest not found: {0}")]
    ContestNotFound(String),
    #[error("not registered for contest {0}")]
    NotRegistered(String),
    #[error("repository error: {0}")]
    Backend(String),
}
