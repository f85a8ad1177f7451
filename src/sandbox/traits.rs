use crate::domain::{ExecutionRequest, SandboxExecutionResult};

/// Executes one (source code, input) pair in an isolated, resource-bounded
/// environment. Never fails past its boundary: every failure path folds into
/// the returned result as `InternalError` or `TimeLimitExceeded`.
#[async_trait::async_trait]
pub trait SandboxRunner: std::fmt::Debug + Send + Sync {
    async fn run(&self, request: &ExecutionRequest) -> SandboxExecutionResult;
}

#[derive(Debug, thiserror::Error)]
#[error("container runtime error: {0}")]
pub struct RuntimeError(pub String);

/// Everything the runtime needs to create one sandbox container. Resource
/// ceilings not named here (CPU share, pids, network) are fixed per policy
/// by the runtime implementation.
#[derive(Clone, Debug)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub cmd: Vec<String>,
    pub workspace_path: String,
    pub memory_bytes: i64,
}

/// Container lifecycle consumed by the sandbox runner. Keeps the daemon
/// client behind a seam so each stage can fail independently in tests.
#[async_trait::async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;

    async fn start(&self, container_id: &str) -> Result<(), RuntimeError>;

    /// Resolves when the container exits, yielding its status code. The
    /// caller bounds this with its own deadline.
    async fn wait(&self, container_id: &str) -> Result<i64, RuntimeError>;

    async fn kill(&self, container_id: &str) -> Result<(), RuntimeError>;

    /// Drains stdout and stderr under a per-stream byte cap, returning
    /// whatever arrived before the implementation's collection deadline.
    /// Stream faults yield partial output, never an error.
    async fn logs(&self, container_id: &str, cap: usize) -> (String, String);

    async fn remove(&self, container_id: &str) -> Result<(), RuntimeError>;
}
