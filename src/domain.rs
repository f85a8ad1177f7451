use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::TRUNCATED_MARKER;

/// Job message as published by the submission API.
#[derive(Clone, Debug, Deserialize)]
pub struct SubmissionJob {
    pub submission_id: String,
    pub problem_id: String,
    pub source_code: String,
    pub language: String,
    /// Seconds. The problem-level limit takes precedence when present.
    pub time_limit: Option<u64>,
    /// MB. Same precedence rule as `time_limit`.
    pub memory_limit: Option<u64>,
}

/// Submission record as stored. The verdict write is a whole-record replace,
/// so duplicate delivery is idempotent on the final state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub status: VerdictStatus,
    #[serde(default)]
    pub verdict: String,
    #[serde(default)]
    pub execution_time_ms: u64,
    #[serde(default)]
    pub memory_used_kb: u64,
    #[serde(default)]
    pub test_cases_passed: usize,
    #[serde(default)]
    pub total_test_cases: usize,
    #[serde(default)]
    pub judged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub test_results: Vec<TestCaseOutcome>,
}

impl Submission {
    pub fn apply_verdict(&mut self, verdict: Verdict) {
        self.status = verdict.final_status;
        self.verdict = verdict.message;
        self.execution_time_ms = verdict.max_execution_time_ms;
        self.memory_used_kb = verdict.max_memory_used_kb;
        self.test_cases_passed = verdict.test_cases_passed;
        self.total_test_cases = verdict.total_test_cases;
        self.judged_at = Some(Utc::now());
        self.test_results = verdict.outcomes;
    }
}

/// One hidden (input, expected output) pair. Ordering is significant: the
/// position defines "test case N" in user-facing messages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

/// Narrow projection of a problem record: only what judging needs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HiddenTestSet {
    pub test_cases: Vec<TestCase>,
    /// Problem-level time limit in seconds, overriding the job-level one.
    #[serde(default)]
    pub time_limit: Option<u64>,
    /// Problem-level memory limit in MB, overriding the job-level one.
    #[serde(default)]
    pub memory_limit: Option<u64>,
    /// When set, outputs are graded as single floats within this tolerance.
    #[serde(default)]
    pub float_tolerance: Option<f64>,
}

/// Everything one sandbox invocation needs. Constructed fresh per test case.
#[derive(Clone, Debug)]
pub struct ExecutionRequest {
    pub source_code: String,
    pub language: String,
    pub stdin: String,
    pub time_limit_secs: u64,
    pub memory_limit_mb: u64,
}

/// Effective limits after applying the precedence rule
/// (problem > job > language profile default).
#[derive(Clone, Copy, Debug)]
pub struct ExecutionLimits {
    pub time_limit_secs: u64,
    pub memory_limit_mb: u64,
}

/// Status token reported by the driver script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SandboxStatus {
    Success,
    CompilationError,
    RuntimeError,
    TimeLimitExceeded,
    InternalError,
}

impl SandboxStatus {
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "SUCCESS" => Some(Self::Success),
            "COMPILATION_ERROR" => Some(Self::CompilationError),
            "RUNTIME_ERROR" => Some(Self::RuntimeError),
            "TIME_LIMIT_EXCEEDED" => Some(Self::TimeLimitExceeded),
            "INTERNAL_ERROR" => Some(Self::InternalError),
            _ => None,
        }
    }
}

/// Outcome of one sandbox invocation. Produced exactly once per
/// `ExecutionRequest`, never mutated after construction.
#[derive(Clone, Debug)]
pub struct SandboxExecutionResult {
    pub status: SandboxStatus,
    pub output: String,
    pub execution_time_ms: Option<u64>,
    pub memory_used_kb: Option<u64>,
}

impl SandboxExecutionResult {
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            status: SandboxStatus::InternalError,
            output: message.into(),
            execution_time_ms: None,
            memory_used_kb: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictStatus {
    Pending,
    Judging,
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
    #[serde(rename = "Time Limit Exceeded")]
    TimeLimitExceeded,
    #[serde(rename = "Runtime Error")]
    RuntimeError,
    #[serde(rename = "Compilation Error")]
    CompilationError,
    #[serde(rename = "Internal Error")]
    InternalError,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Pending => "Pending",
            Self::Judging => "Judging",
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "Wrong Answer",
            Self::TimeLimitExceeded => "Time Limit Exceeded",
            Self::RuntimeError => "Runtime Error",
            Self::CompilationError => "Compilation Error",
            Self::InternalError => "Internal Error",
        };
        f.write_str(text)
    }
}

/// Per-test-case diagnostic record. Fields are aggressively truncated: they
/// exist for display, not for re-grading.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestCaseOutcome {
    /// 1-based position in the hidden test set.
    pub index: usize,
    pub status: VerdictStatus,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub execution_time_ms: Option<u64>,
}

/// The single artifact the pipeline hands back per submission attempt.
#[derive(Clone, Debug)]
pub struct Verdict {
    pub final_status: VerdictStatus,
    pub message: String,
    pub max_execution_time_ms: u64,
    pub max_memory_used_kb: u64,
    pub test_cases_passed: usize,
    pub total_test_cases: usize,
    pub outcomes: Vec<TestCaseOutcome>,
}

/// Truncates to `cap` characters, appending an explicit marker when cut.
pub fn truncate_with(text: &str, cap: usize, marker: &str) -> String {
    if text.chars().count() <= cap {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(cap).collect();
        cut.push_str(marker);
        cut
    }
}

pub fn truncate(text: &str, cap: usize) -> String {
    truncate_with(text, cap, TRUNCATED_MARKER)
}
