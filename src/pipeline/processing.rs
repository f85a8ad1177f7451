//! Per-submission orchestration against the store: mark as judging, load
//! the hidden test set, resolve effective limits, evaluate, write back.

use crate::domain::{ExecutionLimits, SubmissionJob, VerdictStatus};
use crate::error::JudgeError;
use crate::language::LanguageProfileResolver;
use crate::pipeline::judging;
use crate::sandbox::traits::SandboxRunner;
use crate::store::traits::SubmissionStore;

pub async fn process_submission(
    store: &dyn SubmissionStore,
    runner: &dyn SandboxRunner,
    resolver: &LanguageProfileResolver,
    job: &SubmissionJob,
) -> Result<(), JudgeError> {
    let mut submission = store
        .find_submission_by_id(&job.submission_id)
        .await?
        .ok_or_else(|| JudgeError::SubmissionNotFound(job.submission_id.clone()))?;

    submission.status = VerdictStatus::Judging;
    store.save_submission(submission.clone()).await?;

    let test_set = store
        .find_hidden_test_cases_by_problem_id(&job.problem_id)
        .await?
        .ok_or_else(|| JudgeError::ProblemNotFound(job.problem_id.clone()))?;

    // Precedence: problem-level limit, then job-level, then profile default.
    let profile = resolver.resolve(&job.language).profile().clone();
    let limits = ExecutionLimits {
        time_limit_secs: test_set
            .time_limit
            .or(job.time_limit)
            .unwrap_or(profile.default_time_limit_secs),
        memory_limit_mb: test_set
            .memory_limit
            .or(job.memory_limit)
            .unwrap_or(profile.default_memory_limit_mb),
    };

    let verdict = judging::evaluate(
        job,
        &test_set.test_cases,
        &limits,
        test_set.float_tolerance,
        runner,
    )
    .await?;

    tracing::info!(
        verdict = %verdict.final_status,
        passed = verdict.test_cases_passed,
        total = verdict.total_test_cases,
        "submission judged"
    );

    submission.apply_verdict(verdict);
    store.save_submission(submission).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageConfig;
    use crate::domain::{
        HiddenTestSet, SandboxExecutionResult, SandboxStatus, Submission, TestCase,
    };
    use crate::sandbox::stubs::ScriptedSandbox;
    use crate::store::memory::MemoryStore;
    use crate::store::traits::{MockSubmissionStore, StoreError};

    fn resolver() -> LanguageProfileResolver {
        LanguageProfileResolver::new(&ImageConfig::default())
    }

    fn job() -> SubmissionJob {
        SubmissionJob {
            submission_id: "s1".to_string(),
            problem_id: "p1".to_string(),
            source_code: "print(input())".to_string(),
            language: "python".to_string(),
            time_limit: Some(10),
            memory_limit: None,
        }
    }

    fn pending(id: &str) -> Submission {
        Submission {
            id: id.to_string(),
            status: VerdictStatus::Pending,
            verdict: String::new(),
            execution_time_ms: 0,
            memory_used_kb: 0,
            test_cases_passed: 0,
            total_test_cases: 0,
            judged_at: None,
            test_results: vec![],
        }
    }

    fn success(output: &str) -> SandboxExecutionResult {
        SandboxExecutionResult {
            status: SandboxStatus::Success,
            output: output.to_string(),
            execution_time_ms: Some(50),
            memory_used_kb: None,
        }
    }

    fn problem(time_limit: Option<u64>, cases: Vec<(&str, &str)>) -> HiddenTestSet {
        HiddenTestSet {
            test_cases: cases
                .into_iter()
                .map(|(input, expected)| TestCase {
                    input: input.to_string(),
                    expected_output: expected.to_string(),
                })
                .collect(),
            time_limit,
            memory_limit: None,
            float_tolerance: None,
        }
    }

    #[tokio::test]
    async fn happy_path_writes_the_full_verdict() {
        let store = MemoryStore::new();
        store.insert_submission(pending("s1"));
        store.insert_problem("p1", problem(None, vec![("1", "1"), ("2", "2")]));
        let runner = ScriptedSandbox::new(vec![success("1\n"), success("2\n")]);

        process_submission(&store, &runner, &resolver(), &job())
            .await
            .unwrap();

        let stored = store.find_submission_by_id("s1").await.unwrap().unwrap();
        assert_eq!(stored.status, VerdictStatus::Accepted);
        assert_eq!(stored.verdict, "All test cases passed");
        assert_eq!(stored.test_cases_passed, 2);
        assert_eq!(stored.total_test_cases, 2);
        assert_eq!(stored.test_results.len(), 2);
        assert!(stored.judged_at.is_some());
    }

    #[tokio::test]
    async fn missing_submission_is_a_distinguishable_fault() {
        let store = MemoryStore::new();
        let runner = ScriptedSandbox::new(vec![]);

        let result = process_submission(&store, &runner, &resolver(), &job()).await;

        assert!(matches!(result, Err(JudgeError::SubmissionNotFound(id)) if id == "s1"));
        assert_eq!(runner.calls(), 0);
    }

    #[tokio::test]
    async fn missing_problem_aborts_before_any_sandbox_work() {
        let store = MemoryStore::new();
        store.insert_submission(pending("s1"));
        let runner = ScriptedSandbox::new(vec![]);

        let result = process_submission(&store, &runner, &resolver(), &job()).await;

        assert!(matches!(result, Err(JudgeError::ProblemNotFound(id)) if id == "p1"));
        assert_eq!(runner.calls(), 0);
        // Left in Judging; the consumer compensates with an error write.
        let stored = store.find_submission_by_id("s1").await.unwrap().unwrap();
        assert_eq!(stored.status, VerdictStatus::Judging);
    }

    #[tokio::test]
    async fn problem_limits_take_precedence_over_job_limits() {
        let store = MemoryStore::new();
        store.insert_submission(pending("s1"));
        store.insert_problem("p1", problem(Some(3), vec![("1", "1")]));
        let runner = ScriptedSandbox::new(vec![success("1\n")]);

        process_submission(&store, &runner, &resolver(), &job())
            .await
            .unwrap();

        // The job asked for 10s; the problem's 3s wins.
        assert_eq!(runner.requests()[0].time_limit_secs, 3);
        // Memory was absent on both; the profile default applies.
        assert_eq!(runner.requests()[0].memory_limit_mb, 256);
    }

    #[tokio::test]
    async fn empty_test_set_surfaces_as_a_configuration_fault() {
        let store = MemoryStore::new();
        store.insert_submission(pending("s1"));
        store.insert_problem("p1", problem(None, vec![]));
        let runner = ScriptedSandbox::new(vec![]);

        let result = process_submission(&store, &runner, &resolver(), &job()).await;

        assert!(matches!(result, Err(JudgeError::NoTestCases(_))));
    }

    #[tokio::test]
    async fn store_failures_propagate_as_judge_errors() {
        let mut store = MockSubmissionStore::new();
        store
            .expect_find_submission_by_id()
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));
        let runner = ScriptedSandbox::new(vec![]);

        let result = process_submission(&store, &runner, &resolver(), &job()).await;

        assert!(matches!(result, Err(JudgeError::Store(_))));
    }
}
