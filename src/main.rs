use std::collections::HashMap;
use std::panic;
use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::channel;
use tracing_subscriber::EnvFilter;

use crate::config::WorkerConfig;
use crate::domain::{HiddenTestSet, Submission, SubmissionJob};
use crate::language::LanguageProfileResolver;
use crate::pipeline::consuming::handle_jobs;
use crate::sandbox::docker::DockerRuntime;
use crate::sandbox::runner::ContainerSandboxRunner;
use crate::store::memory::MemoryStore;

mod compare;
mod config;
mod constants;
mod domain;
mod error;
mod language;
mod pipeline;
mod sandbox;
mod store;

/// Optional local fixtures: submissions and problems to seed the store with,
/// so the worker can be exercised without the real persistence tier.
#[derive(Debug, Deserialize)]
struct Fixtures {
    #[serde(default)]
    submissions: Vec<Submission>,
    #[serde(default)]
    problems: HashMap<String, HiddenTestSet>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let config = WorkerConfig::from_env();
    let resolver = Arc::new(LanguageProfileResolver::new(&config.images));
    let runtime = Arc::new(DockerRuntime::connect()?);
    let runner = Arc::new(ContainerSandboxRunner::new(
        runtime,
        resolver.clone(),
        config.max_output_bytes,
    ));
    let store = Arc::new(MemoryStore::new());

    if let Ok(path) = std::env::var("JUDGE_FIXTURES") {
        seed_store(&store, &path).await?;
    }

    let (job_tx, job_rx) = channel::<SubmissionJob>(config.queue_capacity);
    let worker = handle_jobs(job_rx, store, runner, resolver, config.pool_size);

    tracing::info!(pool_size = config.pool_size, "judge worker started, reading jobs from stdin");

    // Narrow transport adapter: one JSON job message per line, the same
    // schema the queue publisher emits.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SubmissionJob>(&line) {
            Ok(job) => {
                if job_tx.send(job).await.is_err() {
                    break;
                }
            }
            Err(err) => tracing::error!(error = %err, "invalid job message"),
        }
    }

    drop(job_tx);
    worker.await?;

    Ok(())
}

async fn seed_store(store: &MemoryStore, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let fixtures: Fixtures = serde_json::from_str(&raw)?;
    tracing::info!(
        submissions = fixtures.submissions.len(),
        problems = fixtures.problems.len(),
        "seeding store from fixtures"
    );
    for submission in fixtures.submissions {
        store.insert_submission(submission);
    }
    for (problem_id, test_set) in fixtures.problems {
        store.insert_problem(&problem_id, test_set);
    }
    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
