//! The verdict state machine: a strict left-to-right scan over the hidden
//! test set, one sandbox invocation per case, early exit on the first
//! non-accepted outcome.

use crate::compare;
use crate::constants::{FINAL_MESSAGE_CAP, OUTCOME_FIELD_CAP};
use crate::domain::{
    ExecutionLimits, ExecutionRequest, SandboxStatus, SubmissionJob, TestCase, TestCaseOutcome,
    Verdict, VerdictStatus, truncate,
};
use crate::error::JudgeError;
use crate::sandbox::traits::SandboxRunner;

/// Runs every test case in order until the first failure and folds the
/// sandbox results into a single verdict. An empty test set is a problem
/// configuration error, not a judging outcome.
pub async fn evaluate(
    job: &SubmissionJob,
    test_cases: &[TestCase],
    limits: &ExecutionLimits,
    float_tolerance: Option<f64>,
    runner: &dyn SandboxRunner,
) -> Result<Verdict, JudgeError> {
    if test_cases.is_empty() {
        return Err(JudgeError::NoTestCases(job.problem_id.clone()));
    }

    let mut final_status = VerdictStatus::Accepted;
    let mut message = "All test cases passed".to_string();
    let mut outcomes = Vec::new();
    let mut passed = 0;
    let mut max_execution_time_ms = 0u64;
    let mut max_memory_used_kb = 0u64;

    for (idx, test_case) in test_cases.iter().enumerate() {
        let number = idx + 1;
        tracing::debug!("running test case {}/{}", number, test_cases.len());

        let request = ExecutionRequest {
            source_code: job.source_code.clone(),
            language: job.language.clone(),
            stdin: test_case.input.clone(),
            time_limit_secs: limits.time_limit_secs,
            memory_limit_mb: limits.memory_limit_mb,
        };
        let result = runner.run(&request).await;

        // Maxima reflect every case actually evaluated, failing ones included.
        if let Some(time) = result.execution_time_ms {
            max_execution_time_ms = max_execution_time_ms.max(time);
        }
        if let Some(memory) = result.memory_used_kb {
            max_memory_used_kb = max_memory_used_kb.max(memory);
        }

        let case_status = match result.status {
            SandboxStatus::CompilationError => {
                final_status = VerdictStatus::CompilationError;
                message = truncate(&result.output, FINAL_MESSAGE_CAP);
                VerdictStatus::CompilationError
            }
            SandboxStatus::TimeLimitExceeded => {
                final_status = VerdictStatus::TimeLimitExceeded;
                message = format!("Time limit exceeded on test case {number}");
                VerdictStatus::TimeLimitExceeded
            }
            SandboxStatus::RuntimeError => {
                final_status = VerdictStatus::RuntimeError;
                message = truncate(&result.output, FINAL_MESSAGE_CAP);
                VerdictStatus::RuntimeError
            }
            SandboxStatus::InternalError => {
                final_status = VerdictStatus::InternalError;
                message = "Judge Internal Error".to_string();
                VerdictStatus::InternalError
            }
            SandboxStatus::Success => {
                let matched = match float_tolerance {
                    Some(epsilon) => compare::matches_with_tolerance(
                        &test_case.expected_output,
                        &result.output,
                        epsilon,
                    ),
                    None => compare::matches(&test_case.expected_output, &result.output),
                };
                if matched {
                    passed += 1;
                    VerdictStatus::Accepted
                } else {
                    final_status = VerdictStatus::WrongAnswer;
                    message = format!("Wrong answer on test case {number}");
                    VerdictStatus::WrongAnswer
                }
            }
        };

        outcomes.push(TestCaseOutcome {
            index: number,
            status: case_status,
            input: truncate(&test_case.input, OUTCOME_FIELD_CAP),
            expected_output: truncate(&test_case.expected_output, OUTCOME_FIELD_CAP),
            actual_output: truncate(&result.output, OUTCOME_FIELD_CAP),
            execution_time_ms: result.execution_time_ms,
        });

        // Adversarial code must not run against the remaining hidden cases
        // once it already failed one.
        if final_status != VerdictStatus::Accepted {
            break;
        }
    }

    Ok(Verdict {
        final_status,
        message,
        max_execution_time_ms,
        max_memory_used_kb,
        test_cases_passed: passed,
        total_test_cases: test_cases.len(),
        outcomes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TRUNCATED_MARKER;
    use crate::domain::SandboxExecutionResult;
    use crate::sandbox::stubs::ScriptedSandbox;

    fn job() -> SubmissionJob {
        SubmissionJob {
            submission_id: "s1".to_string(),
            problem_id: "p1".to_string(),
            source_code: "print(input())".to_string(),
            language: "python".to_string(),
            time_limit: None,
            memory_limit: None,
        }
    }

    fn limits() -> ExecutionLimits {
        ExecutionLimits {
            time_limit_secs: 2,
            memory_limit_mb: 256,
        }
    }

    fn case(input: &str, expected: &str) -> TestCase {
        TestCase {
            input: input.to_string(),
            expected_output: expected.to_string(),
        }
    }

    fn success(output: &str, time_ms: u64) -> SandboxExecutionResult {
        SandboxExecutionResult {
            status: SandboxStatus::Success,
            output: output.to_string(),
            execution_time_ms: Some(time_ms),
            memory_used_kb: None,
        }
    }

    fn failure(status: SandboxStatus, output: &str, time_ms: u64) -> SandboxExecutionResult {
        SandboxExecutionResult {
            status,
            output: output.to_string(),
            execution_time_ms: Some(time_ms),
            memory_used_kb: None,
        }
    }

    #[tokio::test]
    async fn all_cases_passing_is_accepted() {
        let runner = ScriptedSandbox::new(vec![success("1\n", 40), success("2\n", 60)]);
        let verdict = evaluate(
            &job(),
            &[case("1", "1"), case("2", "2")],
            &limits(),
            None,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(verdict.final_status, VerdictStatus::Accepted);
        assert_eq!(verdict.message, "All test cases passed");
        assert_eq!(verdict.test_cases_passed, 2);
        assert_eq!(verdict.total_test_cases, 2);
        assert_eq!(verdict.outcomes.len(), 2);
        assert_eq!(verdict.max_execution_time_ms, 60);
    }

    #[tokio::test]
    async fn stops_at_the_first_failing_case() {
        let runner = ScriptedSandbox::new(vec![
            success("1\n", 10),
            success("wrong\n", 10),
            success("3\n", 10),
        ]);
        let verdict = evaluate(
            &job(),
            &[case("1", "1"), case("2", "2"), case("3", "3")],
            &limits(),
            None,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(verdict.final_status, VerdictStatus::WrongAnswer);
        assert_eq!(verdict.message, "Wrong answer on test case 2");
        assert_eq!(verdict.outcomes.len(), 2);
        assert_eq!(verdict.test_cases_passed, 1);
        assert_eq!(verdict.total_test_cases, 3);
        // The third case was never executed.
        assert_eq!(runner.calls(), 2);
    }

    #[tokio::test]
    async fn compilation_error_carries_the_truncated_payload() {
        let long_diagnostics = format!("syntax error on line 3\n{}", "e".repeat(1500));
        let runner = ScriptedSandbox::new(vec![failure(
            SandboxStatus::CompilationError,
            &long_diagnostics,
            5,
        )]);
        let verdict = evaluate(&job(), &[case("1", "1")], &limits(), None, &runner)
            .await
            .unwrap();

        assert_eq!(verdict.final_status, VerdictStatus::CompilationError);
        assert!(verdict.message.starts_with("syntax error on line 3"));
        assert!(verdict.message.ends_with(TRUNCATED_MARKER));
        assert_eq!(
            verdict.message.chars().count(),
            1000 + TRUNCATED_MARKER.chars().count()
        );
    }

    #[tokio::test]
    async fn time_limit_names_the_one_based_index() {
        let runner = ScriptedSandbox::new(vec![
            success("1\n", 30),
            SandboxExecutionResult {
                status: SandboxStatus::TimeLimitExceeded,
                output: "Execution timed out".to_string(),
                execution_time_ms: Some(2000),
                memory_used_kb: None,
            },
        ]);
        let verdict = evaluate(
            &job(),
            &[case("1", "1"), case("2", "2")],
            &limits(),
            None,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(verdict.final_status, VerdictStatus::TimeLimitExceeded);
        assert_eq!(verdict.message, "Time limit exceeded on test case 2");
        assert_eq!(verdict.max_execution_time_ms, 2000);
        assert_eq!(verdict.outcomes[1].execution_time_ms, Some(2000));
    }

    #[tokio::test]
    async fn internal_error_discards_the_payload() {
        let runner = ScriptedSandbox::new(vec![failure(
            SandboxStatus::InternalError,
            "Internal error: daemon unreachable",
            0,
        )]);
        let verdict = evaluate(&job(), &[case("1", "1")], &limits(), None, &runner)
            .await
            .unwrap();

        assert_eq!(verdict.final_status, VerdictStatus::InternalError);
        assert_eq!(verdict.message, "Judge Internal Error");
    }

    #[tokio::test]
    async fn runtime_error_carries_the_payload() {
        let runner = ScriptedSandbox::new(vec![failure(
            SandboxStatus::RuntimeError,
            "Segmentation fault",
            25,
        )]);
        let verdict = evaluate(&job(), &[case("1", "1")], &limits(), None, &runner)
            .await
            .unwrap();

        assert_eq!(verdict.final_status, VerdictStatus::RuntimeError);
        assert_eq!(verdict.message, "Segmentation fault");
    }

    #[tokio::test]
    async fn maxima_include_failing_cases() {
        let runner = ScriptedSandbox::new(vec![
            SandboxExecutionResult {
                status: SandboxStatus::Success,
                output: "1\n".to_string(),
                execution_time_ms: Some(100),
                memory_used_kb: Some(2048),
            },
            SandboxExecutionResult {
                status: SandboxStatus::RuntimeError,
                output: "crash".to_string(),
                execution_time_ms: Some(300),
                memory_used_kb: Some(512),
            },
        ]);
        let verdict = evaluate(
            &job(),
            &[case("1", "1"), case("2", "2")],
            &limits(),
            None,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(verdict.max_execution_time_ms, 300);
        assert_eq!(verdict.max_memory_used_kb, 2048);
    }

    #[tokio::test]
    async fn outcome_fields_are_truncated_for_display() {
        let big_input = "i".repeat(150);
        let big_output = "o".repeat(150);
        let runner = ScriptedSandbox::new(vec![success(&big_output, 10)]);
        let verdict = evaluate(
            &job(),
            &[case(&big_input, "expected")],
            &limits(),
            None,
            &runner,
        )
        .await
        .unwrap();

        let outcome = &verdict.outcomes[0];
        assert!(outcome.input.ends_with(TRUNCATED_MARKER));
        assert!(outcome.actual_output.ends_with(TRUNCATED_MARKER));
        assert_eq!(
            outcome.input.chars().count(),
            100 + TRUNCATED_MARKER.chars().count()
        );
        assert_eq!(outcome.expected_output, "expected");
    }

    #[tokio::test]
    async fn empty_test_set_fails_fast() {
        let runner = ScriptedSandbox::new(vec![]);
        let result = evaluate(&job(), &[], &limits(), None, &runner).await;

        assert!(matches!(result, Err(JudgeError::NoTestCases(_))));
        assert_eq!(runner.calls(), 0);
    }

    #[tokio::test]
    async fn tolerance_mode_grades_floats() {
        let runner = ScriptedSandbox::new(vec![success("3.14160\n", 10)]);
        let verdict = evaluate(
            &job(),
            &[case("", "3.14159")],
            &limits(),
            Some(0.001),
            &runner,
        )
        .await
        .unwrap();
        assert_eq!(verdict.final_status, VerdictStatus::Accepted);

        let runner = ScriptedSandbox::new(vec![success("3.14160\n", 10)]);
        let verdict = evaluate(
            &job(),
            &[case("", "3.14159")],
            &limits(),
            Some(0.000001),
            &runner,
        )
        .await
        .unwrap();
        assert_eq!(verdict.final_status, VerdictStatus::WrongAnswer);
    }

    #[tokio::test]
    async fn requests_carry_the_resolved_limits() {
        let runner = ScriptedSandbox::new(vec![success("1\n", 10)]);
        evaluate(&job(), &[case("1", "1")], &limits(), None, &runner)
            .await
            .unwrap();

        let requests = runner.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].time_limit_secs, 2);
        assert_eq!(requests[0].memory_limit_mb, 256);
        assert_eq!(requests[0].stdin, "1");
    }
}
