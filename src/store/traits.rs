use crate::domain::{HiddenTestSet, Submission};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Narrow persistence boundary consumed by the pipeline. Lookups return
/// `None` for missing records; the pipeline branches on absence instead of
/// catching.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_submission_by_id(&self, id: &str) -> Result<Option<Submission>, StoreError>;

    async fn save_submission(&self, submission: Submission) -> Result<(), StoreError>;

    /// Projection of the problem record: hidden test cases plus the
    /// problem-level limits the precedence rule needs, nothing else.
    async fn find_hidden_test_cases_by_problem_id(
        &self,
        id: &str,
    ) -> Result<Option<HiddenTestSet>, StoreError>;
}
