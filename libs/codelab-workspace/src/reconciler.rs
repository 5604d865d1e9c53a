//! Result Reconciler - Backend Results to UI Records
//!
//! **Core Responsibility:**
//! Map the execution backend's per-case result arrays onto `ResultRecord`s the
//! workspace can present, and summarize them.
//!
//! **Critical Properties:**
//! - Knows nothing about HTTP
//! - Knows nothing about the controller's state machine
//! - Pure functions: (backend payload, visible cases) → records
//!
//! **Defaults for absent fields:**
//! - `execution_time` / `memory`: 0
//! - `error`: empty
//! - `status`: `"Unknown"`
//!
//! **Hidden cases:**
//! A hidden record keeps its true values in memory. Masking happens at the
//! presentation boundary: `ResultRecord::view` is the only projection handed
//! to a renderer, and for hidden records it withholds input, output, expected
//! and error unconditionally.
//!
//! **Verdicts:**
//! The submit verdict and pass counts are the backend's. They are never
//! recomputed from individual `passed` flags.

use codelab_common::types::{CaseResult, SubmitData, Verdict};
use serde::Serialize;
use tracing::debug;

use crate::codec;
use crate::error::ServiceError;
use crate::test_cases::TestCase;

pub const UNKNOWN_STATUS: &str = "Unknown";
pub const EMPTY_RESULTS_STATUS: &str = "Error";

/// One evaluated case as held by the workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub passed: bool,
    pub input: String,
    pub output: String,
    pub expected: String,
    pub execution_time: f64,
    pub memory: f64,
    pub error: String,
    pub status: String,
    pub is_hidden: bool,
    pub test_case_number: u32,
}

/// Render-safe projection of a `ResultRecord`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView<'a> {
    pub test_case_number: u32,
    pub passed: bool,
    pub status: &'a str,
    pub execution_time: f64,
    pub memory: f64,
    pub is_hidden: bool,
    pub input: Option<&'a str>,
    pub output: Option<&'a str>,
    pub expected: Option<&'a str>,
    pub error: Option<&'a str>,
}

impl ResultRecord {
    /// Single failed record standing in for a whole request
    pub fn synthetic(status: &str, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            input: String::new(),
            output: String::new(),
            expected: String::new(),
            execution_time: 0.0,
            memory: 0.0,
            error: message.into(),
            status: status.to_string(),
            is_hidden: false,
            test_case_number: 1,
        }
    }

    pub fn from_service_error(err: &ServiceError) -> Self {
        Self::synthetic(err.result_status(), err.to_string())
    }

    pub fn view(&self) -> ResultView<'_> {
        if self.is_hidden {
            return ResultView {
                test_case_number: self.test_case_number,
                passed: self.passed,
                status: &self.status,
                execution_time: self.execution_time,
                memory: self.memory,
                is_hidden: true,
                input: None,
                output: None,
                expected: None,
                error: None,
            };
        }

        ResultView {
            test_case_number: self.test_case_number,
            passed: self.passed,
            status: &self.status,
            execution_time: self.execution_time,
            memory: self.memory,
            is_hidden: false,
            input: Some(&self.input),
            output: Some(&self.output),
            expected: Some(&self.expected),
            error: (!self.error.is_empty()).then_some(self.error.as_str()),
        }
    }
}

fn map_case(result: &CaseResult, position: usize) -> ResultRecord {
    ResultRecord {
        passed: result.is_correct,
        input: result.input.clone().unwrap_or_default(),
        output: result.actual_output.clone().unwrap_or_default(),
        expected: result.expected_output.clone().unwrap_or_default(),
        execution_time: result.time.unwrap_or(0.0),
        memory: result.memory.unwrap_or(0.0),
        error: result.error.clone().unwrap_or_default(),
        status: result
            .status
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        is_hidden: false,
        test_case_number: (position + 1) as u32,
    }
}

/// Map run results positionally onto the cases that were sent.
///
/// Input and expected values the backend leaves out are filled from the
/// case at the same position. An empty result array becomes one synthetic
/// `"Error"` record.
pub fn reconcile_run_results(results: &[CaseResult], sent: &[TestCase]) -> Vec<ResultRecord> {
    if results.is_empty() {
        debug!(sent = sent.len(), "Run returned no results");
        return vec![ResultRecord::synthetic(
            EMPTY_RESULTS_STATUS,
            "No results were returned for this run",
        )];
    }

    results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let mut record = map_case(result, idx);
            if let Some(case) = sent.get(idx) {
                if result.input.is_none() {
                    record.input = codec::encode(&case.input_values());
                }
                if result.expected_output.is_none() {
                    record.expected = case.output_value().to_string();
                }
            }
            record
        })
        .collect()
}

/// Backend-authoritative outcome of a submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitSummary {
    #[serde(skip)]
    pub verdict: Verdict,
    pub raw_status: String,
    pub passed_tests: u32,
    pub total_tests: u32,
}

impl SubmitSummary {
    /// e.g. "3/5 Passed"
    pub fn display(&self) -> String {
        format!("{}/{} Passed", self.passed_tests, self.total_tests)
    }

    pub fn score_percent(&self) -> u32 {
        if self.total_tests == 0 {
            return 0;
        }
        ((self.passed_tests as f64 / self.total_tests as f64) * 100.0).round() as u32
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }
}

pub fn reconcile_submit_results(data: &SubmitData) -> (SubmitSummary, Vec<ResultRecord>) {
    let records: Vec<ResultRecord> = data
        .test_results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let mut record = map_case(result, idx);
            record.is_hidden = result.is_hidden;
            if let Some(number) = result.test_case_number {
                record.test_case_number = number;
            }
            record
        })
        .collect();

    let summary = SubmitSummary {
        verdict: Verdict::parse(&data.status),
        raw_status: data.status.clone(),
        passed_tests: data.passed_tests,
        total_tests: data.total_tests,
    };

    debug!(
        verdict = ?summary.verdict,
        passed = summary.passed_tests,
        total = summary.total_tests,
        hidden = records.iter().filter(|r| r.is_hidden).count(),
        "Submit results reconciled"
    );

    (summary, records)
}

/// Aggregate over the records of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        Self {
            passed: records.iter().filter(|r| r.passed).count(),
            total: records.len(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }

    pub fn display(&self) -> String {
        format!("{}/{} Passed", self.passed, self.total)
    }
}
