use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::{ExecutionRequest, SandboxExecutionResult};
use crate::sandbox::traits::SandboxRunner;

/// Returns a fixed result after a fixed delay.
#[derive(Debug)]
pub struct SandboxStub {
    result: SandboxExecutionResult,
    delay: Duration,
}

impl SandboxStub {
    pub fn new(result: SandboxExecutionResult, delay: Duration) -> Self {
        Self { result, delay }
    }
}

#[async_trait::async_trait]
impl SandboxRunner for SandboxStub {
    async fn run(&self, request: &ExecutionRequest) -> SandboxExecutionResult {
        tracing::debug!("stub execution: request={:?}", request);
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

/// Replays a scripted sequence of results, one per invocation, and records
/// every request it saw. Exhaustion yields an internal-error result.
#[derive(Debug, Default)]
pub struct ScriptedSandbox {
    results: Mutex<VecDeque<SandboxExecutionResult>>,
    requests: Mutex<Vec<ExecutionRequest>>,
}

impl ScriptedSandbox {
    pub fn new(results: Vec<SandboxExecutionResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SandboxRunner for ScriptedSandbox {
    async fn run(&self, request: &ExecutionRequest) -> SandboxExecutionResult {
        self.requests.lock().unwrap().push(request.clone());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| SandboxExecutionResult::internal_error("scripted sandbox exhausted"))
    }
}
