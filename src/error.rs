use crate::store::traits::StoreError;

/// Faults that abort judging before a verdict exists. Judge-reported
/// outcomes (wrong answer, time limit, ...) are verdict values, never
/// errors; only infrastructure and configuration problems surface here.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("submission not found: {0}")]
    SubmissionNotFound(String),
    #[error("problem not found: {0}")]
    ProblemNotFound(String),
    #[error("no test cases configured for problem {0}")]
    NoTestCases(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
