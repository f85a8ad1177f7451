//! Bounded worker pool over the job queue. Parallelism exists only across
//! distinct submissions; each submission's test cases run sequentially
//! inside `judging`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::Instrument;

use crate::constants::{POOL_ACQUIRE_ERR, SHUTDOWN_GRACE_SECS};
use crate::domain::{SubmissionJob, VerdictStatus};
use crate::language::LanguageProfileResolver;
use crate::pipeline::processing::process_submission;
use crate::sandbox::traits::SandboxRunner;
use crate::store::traits::SubmissionStore;

/// Consumes jobs one per free pool slot so load spreads evenly instead of
/// one worker hoarding a batch. Returns once the queue is closed and the
/// in-flight jobs are drained (or the grace period elapses).
pub fn handle_jobs(
    mut job_rx: Receiver<SubmissionJob>,
    store: Arc<dyn SubmissionStore>,
    runner: Arc<dyn SandboxRunner>,
    resolver: Arc<LanguageProfileResolver>,
    pool_size: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pool = Arc::new(Semaphore::new(pool_size));

        while let Some(job) = job_rx.recv().await {
            let permit = pool
                .clone()
                .acquire_owned()
                .await
                .expect(POOL_ACQUIRE_ERR);
            let store = store.clone();
            let runner = runner.clone();
            let resolver = resolver.clone();

            let span = tracing::info_span!(
                "judge_job",
                submission_id = %job.submission_id,
                problem_id = %job.problem_id
            );
            tokio::spawn(
                async move {
                    tracing::info!(language = %job.language, "received submission job");
                    match process_submission(store.as_ref(), runner.as_ref(), &resolver, &job)
                        .await
                    {
                        Ok(()) => tracing::info!("successfully processed submission"),
                        Err(err) => {
                            tracing::error!(error = %err, "failed to process submission");
                            write_error_status(
                                store.as_ref(),
                                &job.submission_id,
                                &format!("Internal Judge Error: {err}"),
                            )
                            .await;
                        }
                    }
                    drop(permit);
                }
                .instrument(span),
            );
        }

        // Queue closed: drain in-flight jobs with a bounded grace period.
        let drain = pool.acquire_many(pool_size as u32);
        if timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), drain)
            .await
            .is_err()
        {
            tracing::warn!("shutdown grace period elapsed with jobs still running");
        }
    })
}

/// Best-effort compensation: a pipeline fault must not leave an
/// identifiable submission stuck in `Judging`.
async fn write_error_status(store: &dyn SubmissionStore, submission_id: &str, message: &str) {
    match store.find_submission_by_id(submission_id).await {
        Ok(Some(mut submission)) => {
            submission.status = VerdictStatus::InternalError;
            submission.verdict = message.to_string();
            submission.judged_at = Some(Utc::now());
            if let Err(err) = store.save_submission(submission).await {
                tracing::error!(error = %err, "failed to record internal error status");
            }
        }
        Ok(None) => {
            tracing::error!("submission missing, cannot record internal error status")
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to load submission for error status")
        }
    }
}
