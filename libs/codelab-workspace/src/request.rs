//! Execution Request Builder
//!
//! Run and submit are deliberately asymmetric:
//! - a run carries every case the learner can see, flattened through the codec,
//!   always with `is_hidden: false`
//! - a submit carries no cases; the backend owns the grading set, hidden
//!   cases included, and the client never fabricates that content
//!
//! Blank code is rejected here, before anything reaches the network.

use codelab_common::types::{
    CustomTestCase, Language, McqSubmitRequest, QuestionType, RunRequest, SubmitRequest,
};

use crate::codec;
use crate::error::ValidationError;
use crate::test_cases::TestCase;

fn ensure_code(code: &str) -> Result<(), ValidationError> {
    if code.trim().is_empty() {
        return Err(ValidationError::EmptyCode);
    }
    Ok(())
}

/// Flatten one case into its wire form
pub fn flatten_case(case: &TestCase) -> CustomTestCase {
    CustomTestCase {
        input: codec::encode(&case.input_values()),
        output: case.output_value().to_string(),
        is_hidden: false,
    }
}

pub fn build_run_request(
    problem_id: &str,
    code: &str,
    language: Language,
    test_cases: &[TestCase],
) -> Result<RunRequest, ValidationError> {
    ensure_code(code)?;
    if test_cases.is_empty() {
        return Err(ValidationError::NoTestCases);
    }

    Ok(RunRequest {
        problem_id: problem_id.to_string(),
        code: code.to_string(),
        language,
        custom_test_cases: Some(test_cases.iter().map(flatten_case).collect()),
    })
}

pub fn build_submit_request(
    problem_id: &str,
    contest_id: Option<&str>,
    code: &str,
    language: Language,
) -> Result<SubmitRequest, ValidationError> {
    ensure_code(code)?;

    Ok(SubmitRequest {
        problem_id: problem_id.to_string(),
        contest_id: contest_id.map(str::to_string),
        code: code.to_string(),
        language,
    })
}

pub fn build_mcq_request(
    problem_id: &str,
    contest_id: Option<&str>,
    option_index: usize,
    is_correct: bool,
) -> McqSubmitRequest {
    McqSubmitRequest {
        problem_id: problem_id.to_string(),
        contest_id: contest_id.map(str::to_string),
        mcq_answer: option_index,
        is_correct,
        question_type: QuestionType::Mcq,
    }
}
