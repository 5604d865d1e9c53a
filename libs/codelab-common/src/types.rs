use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Languages accepted by the execution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Cpp,
    C,
    JavaScript,
}

impl Language {
    /// Returns all language variants
    pub fn all_variants() -> &'static [Language] {
        &[
            Language::Python,
            Language::Java,
            Language::Cpp,
            Language::C,
            Language::JavaScript,
        ]
    }

    /// Parse a language from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Language> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "java" => Some(Language::Java),
            "cpp" | "c++" => Some(Language::Cpp),
            "c" => Some(Language::C),
            "javascript" | "js" => Some(Language::JavaScript),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::Java => write!(f, "java"),
            Language::Cpp => write!(f, "cpp"),
            Language::C => write!(f, "c"),
            Language::JavaScript => write!(f, "javascript"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Coding,
    Mcq,
}

// ---------------------------------------------------------------------------
// Problem schema (read-only input)
// ---------------------------------------------------------------------------

/// One named argument a coding problem declares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    pub name: String,
    pub label: String,
}

/// Teacher-authored test case as it appears in the problem schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTestCase {
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

fn default_output_label() -> String {
    "output".to_string()
}

/// Problem as served by the problem repository
///
/// Coding problems carry `input_fields` and `test_cases`;
/// MCQ problems carry `mcq_options`. Unused parts are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSchema {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub input_fields: Vec<InputField>,
    #[serde(default = "default_output_label")]
    pub output_label: String,
    #[serde(default)]
    pub test_cases: Vec<SchemaTestCase>,
    #[serde(default)]
    pub mcq_options: Vec<McqOption>,
    #[serde(default)]
    pub driver_code: HashMap<Language, String>,
}

impl ProblemSchema {
    pub fn is_mcq(&self) -> bool {
        self.question_type == QuestionType::Mcq
    }

    pub fn starter_code(&self, language: Language) -> String {
        self.driver_code.get(&language).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Execution backend wire contract
// ---------------------------------------------------------------------------

/// Flattened learner-visible case sent with a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTestCase {
    pub input: String,
    pub output: String,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub problem_id: String,
    pub code: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_test_cases: Option<Vec<CustomTestCase>>,
}

/// Authoritative submission. Never carries test cases: the backend picks
/// the grading set, hidden cases included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub problem_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contest_id: Option<String>,
    pub code: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McqSubmitRequest {
    pub problem_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contest_id: Option<String>,
    pub mcq_answer: usize,
    pub is_correct: bool,
    pub question_type: QuestionType,
}

/// Standard `{success, data, message}` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-case result reported by the backend. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseResult {
    pub is_correct: bool,
    pub input: Option<String>,
    pub actual_output: Option<String>,
    pub expected_output: Option<String>,
    pub time: Option<f64>,
    pub memory: Option<f64>,
    pub error: Option<String>,
    pub status: Option<String>,
    pub is_hidden: bool,
    pub test_case_number: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunData {
    pub results: Vec<CaseResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitData {
    pub status: String,
    pub passed_tests: u32,
    pub total_tests: u32,
    pub test_results: Vec<CaseResult>,
}

pub type RunResponse = ApiEnvelope<RunData>;
pub type SubmitResponse = ApiEnvelope<SubmitData>;
pub type McqSubmitResponse = ApiEnvelope<serde_json::Value>;

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Overall submission verdict
///
/// Closed set. Anything the backend sends outside it maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Accepted,
    PartiallyCorrect,
    WrongAnswer,
    TimeLimitExceeded,
    RuntimeError,
    CompilationError,
    Unknown,
}

impl Verdict {
    pub fn parse(raw: &str) -> Verdict {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "accepted" => Verdict::Accepted,
            "partiallycorrect" => Verdict::PartiallyCorrect,
            "wronganswer" => Verdict::WrongAnswer,
            "timelimitexceeded" => Verdict::TimeLimitExceeded,
            "runtimeerror" => Verdict::RuntimeError,
            "compilationerror" | "compileerror" => Verdict::CompilationError,
            _ => Verdict::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::PartiallyCorrect => "Partially Correct",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::CompilationError => "Compilation Error",
            Verdict::Unknown => "Unknown",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
