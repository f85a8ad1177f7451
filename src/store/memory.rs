use dashmap::DashMap;

use crate::domain::{HiddenTestSet, Submission};
use crate::store::traits::{StoreError, SubmissionStore};

/// In-memory store used by the binary wiring and tests. A deployment-grade
/// store implements the same trait over the real database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    submissions: DashMap<String, Submission>,
    problems: DashMap<String, HiddenTestSet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_submission(&self, submission: Submission) {
        self.submissions.insert(submission.id.clone(), submission);
    }

    pub fn insert_problem(&self, problem_id: &str, test_set: HiddenTestSet) {
        self.problems.insert(problem_id.to_string(), test_set);
    }
}

#[async_trait::async_trait]
impl SubmissionStore for MemoryStore {
    async fn find_submission_by_id(&self, id: &str) -> Result<Option<Submission>, StoreError> {
        Ok(self.submissions.get(id).map(|entry| entry.clone()))
    }

    async fn save_submission(&self, submission: Submission) -> Result<(), StoreError> {
        self.submissions.insert(submission.id.clone(), submission);
        Ok(())
    }

    async fn find_hidden_test_cases_by_problem_id(
        &self,
        id: &str,
    ) -> Result<Option<HiddenTestSet>, StoreError> {
        Ok(self.problems.get(id).map(|entry| entry.clone()))
    }
}
