use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::time::timeout;
use uuid::Uuid;

use crate::constants::{
    DRIVER_COMMAND, FORCE_STOP_TIMEOUT_SECS, INPUT_FILE_NAME, OUTPUT_TRUNCATED_MARKER,
    WAIT_GRACE_SECS,
};
use crate::domain::{ExecutionRequest, SandboxExecutionResult, SandboxStatus, truncate_with};
use crate::language::{LanguageProfileResolver, ProfileResolution};
use crate::sandbox::traits::{ContainerRuntime, ContainerSpec, RuntimeError, SandboxRunner};

/// Sandboxed execution over a container runtime.
///
/// Each run provisions a uniquely named workspace and container, enforces
/// memory/CPU/pids/network ceilings, awaits termination under a graced
/// deadline, and unconditionally cleans both resources up.
pub struct ContainerSandboxRunner {
    runtime: Arc<dyn ContainerRuntime>,
    resolver: Arc<LanguageProfileResolver>,
    max_output_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
enum SandboxError {
    #[error("failed to create execution environment: {0}")]
    Workspace(#[from] std::io::Error),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Resources provisioned so far. Handed to cleanup on every exit path.
#[derive(Default)]
struct SandboxLease {
    container_id: Option<String>,
    workspace: Option<TempDir>,
}

impl ContainerSandboxRunner {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        resolver: Arc<LanguageProfileResolver>,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            runtime,
            resolver,
            max_output_bytes,
        }
    }

    async fn execute(
        &self,
        request: &ExecutionRequest,
        lease: &mut SandboxLease,
    ) -> Result<SandboxExecutionResult, SandboxError> {
        let workspace = tempfile::Builder::new().prefix("judge-").tempdir()?;
        tracing::debug!(path = %workspace.path().display(), "created workspace");

        let resolution = self.resolver.resolve(&request.language);
        if let ProfileResolution::Fallback { requested, .. } = &resolution {
            tracing::warn!(language = %requested, "unknown language, substituting the default profile");
        }
        let profile = resolution.profile().clone();

        tokio::fs::write(
            workspace.path().join(profile.source_file_name),
            &request.source_code,
        )
        .await?;
        tokio::fs::write(workspace.path().join(INPUT_FILE_NAME), &request.stdin).await?;

        let workspace_path = workspace.path().to_string_lossy().into_owned();
        lease.workspace = Some(workspace);

        // Job messages are untrusted input: limits saturate instead of
        // overflowing.
        let memory_bytes = request.memory_limit_mb.saturating_mul(1024 * 1024);
        let spec = ContainerSpec {
            name: format!("judge-{}", Uuid::new_v4()),
            image: profile.image.clone(),
            cmd: vec![
                "/bin/bash".to_string(),
                DRIVER_COMMAND.to_string(),
                request.time_limit_secs.to_string(),
            ],
            workspace_path,
            memory_bytes: i64::try_from(memory_bytes).unwrap_or(i64::MAX),
        };

        let container_id = self.runtime.create(&spec).await?;
        lease.container_id = Some(container_id.clone());
        tracing::debug!(container_id = %container_id, image = %spec.image, "created container");

        let started = Instant::now();
        self.runtime.start(&container_id).await?;

        let deadline =
            Duration::from_secs(request.time_limit_secs.saturating_add(WAIT_GRACE_SECS));
        let status_code = match timeout(deadline, self.runtime.wait(&container_id)).await {
            Err(_) => {
                tracing::warn!(container_id = %container_id, "container wait deadline elapsed, killing");
                self.force_stop(&container_id).await;
                return Ok(SandboxExecutionResult {
                    status: SandboxStatus::TimeLimitExceeded,
                    output: "Execution timed out".to_string(),
                    execution_time_ms: Some(request.time_limit_secs.saturating_mul(1000)),
                    memory_used_kb: None,
                });
            }
            Ok(Ok(code)) => code,
            Ok(Err(err)) => return Err(err.into()),
        };
        let execution_time_ms = started.elapsed().as_millis() as u64;

        let (stdout, stderr) = self
            .runtime
            .logs(&container_id, self.max_output_bytes)
            .await;
        let (status, output) = parse_driver_output(&stdout, &stderr, self.max_output_bytes);

        // Container memory stats are not reliably available through the
        // stats API; no reading is reported.
        tracing::debug!(?status, execution_time_ms, status_code, "execution completed");

        Ok(SandboxExecutionResult {
            status,
            output,
            execution_time_ms: Some(execution_time_ms),
            memory_used_kb: None,
        })
    }

    /// Forced termination must never stall the caller, even against an
    /// unresponsive daemon.
    async fn force_stop(&self, container_id: &str) {
        let kill = self.runtime.kill(container_id);
        match timeout(Duration::from_secs(FORCE_STOP_TIMEOUT_SECS), kill).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(container_id, error = %err, "failed to kill container")
            }
            Err(_) => tracing::warn!(container_id, "kill deadline elapsed"),
        }
    }

    /// Cleanup runs on every exit path. Its own failures are logged, never
    /// propagated, and never change the returned result.
    async fn cleanup(&self, lease: SandboxLease) {
        if let Some(container_id) = lease.container_id {
            let remove = self.runtime.remove(&container_id);
            match timeout(Duration::from_secs(FORCE_STOP_TIMEOUT_SECS), remove).await {
                Ok(Ok(())) => tracing::debug!(container_id = %container_id, "removed container"),
                Ok(Err(err)) => {
                    tracing::warn!(container_id = %container_id, error = %err, "failed to remove container")
                }
                Err(_) => {
                    tracing::warn!(container_id = %container_id, "container removal deadline elapsed")
                }
            }
        }

        if let Some(workspace) = lease.workspace {
            if let Err(err) = workspace.close() {
                tracing::warn!(error = %err, "failed to delete workspace");
            }
        }
    }
}

#[async_trait::async_trait]
impl SandboxRunner for ContainerSandboxRunner {
    async fn run(&self, request: &ExecutionRequest) -> SandboxExecutionResult {
        let mut lease = SandboxLease::default();
        let result = match self.execute(request, &mut lease).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "sandbox execution failed");
                SandboxExecutionResult::internal_error(format!("Internal error: {err}"))
            }
        };
        self.cleanup(lease).await;
        result
    }
}

impl fmt::Debug for ContainerSandboxRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerSandboxRunner")
            .field("max_output_bytes", &self.max_output_bytes)
            .finish_non_exhaustive()
    }
}

/// Driver output contract: the first stdout line is the status token, the
/// remainder is the payload. A non-success status prefers stderr as the
/// payload when stderr is non-empty. An absent or unrecognized token is an
/// internal error.
fn parse_driver_output(stdout: &str, stderr: &str, cap: usize) -> (SandboxStatus, String) {
    let stdout = stdout.trim();
    let stderr = stderr.trim();

    let (token, rest) = match stdout.split_once('\n') {
        Some((first, rest)) => (first.trim(), rest.trim()),
        None => (stdout, ""),
    };
    let status = SandboxStatus::parse_token(token).unwrap_or(SandboxStatus::InternalError);

    let payload = if status != SandboxStatus::Success && !stderr.is_empty() {
        stderr
    } else {
        rest
    };

    (status, truncate_with(payload, cap, OUTPUT_TRUNCATED_MARKER))
}
