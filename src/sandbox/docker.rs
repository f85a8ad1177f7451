use std::time::Duration;

use bollard::Docker;
use bollard::container::LogOutput;
use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::query_parameters::{
    CreateContainerOptions, KillContainerOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use futures::StreamExt;
use tokio::time::timeout;

use crate::constants::{CPU_PERIOD, CPU_QUOTA, LOG_COLLECT_TIMEOUT_SECS, PIDS_LIMIT, WORKSPACE_MOUNT};
use crate::sandbox::traits::{ContainerRuntime, ContainerSpec, RuntimeError};

/// Container lifecycle backed by the local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    pub fn connect() -> Result<Self, bollard::errors::Error> {
        Ok(Self::new(Docker::connect_with_local_defaults()?))
    }
}

#[async_trait::async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let host_config = HostConfig {
            memory: Some(spec.memory_bytes),
            // Swap ceiling equals the memory ceiling: the kernel cannot
            // silently extend memory via swap.
            memory_swap: Some(spec.memory_bytes),
            cpu_quota: Some(CPU_QUOTA),
            cpu_period: Some(CPU_PERIOD),
            pids_limit: Some(PIDS_LIMIT),
            network_mode: Some("none".to_string()),
            binds: Some(vec![format!("{}:{WORKSPACE_MOUNT}", spec.workspace_path)]),
            ..Default::default()
        };
        let body = ContainerCreateBody {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            working_dir: Some(WORKSPACE_MOUNT.to_string()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(host_config),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: Some(spec.name.clone()),
            ..Default::default()
        };

        let container = self
            .docker
            .create_container(Some(options), body)
            .await
            .map_err(runtime_err)?;
        Ok(container.id)
    }

    async fn start(&self, container_id: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions>)
            .await
            .map_err(runtime_err)
    }

    async fn wait(&self, container_id: &str) -> Result<i64, RuntimeError> {
        let mut stream = self
            .docker
            .wait_container(container_id, None::<WaitContainerOptions>);
        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // A non-zero exit is a normal termination; the driver reports
            // the judge-level status through its output contract.
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(err)) => Err(runtime_err(err)),
            None => Err(RuntimeError(
                "container wait stream closed without a status".to_string(),
            )),
        }
    }

    async fn kill(&self, container_id: &str) -> Result<(), RuntimeError> {
        self.docker
            .kill_container(container_id, None::<KillContainerOptions>)
            .await
            .map_err(runtime_err)
    }

    /// Reads both log streams up to the byte cap each, under a fixed
    /// deadline independent of the execution deadline, so a broken or
    /// flooding stream cannot stall the worker.
    async fn logs(&self, container_id: &str, cap: usize) -> (String, String) {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut stream = self.docker.logs(container_id, Some(options));

        let mut stdout = String::new();
        let mut stderr = String::new();
        let drain = async {
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(LogOutput::StdOut { message }) => {
                        append_capped(&mut stdout, &message, cap)
                    }
                    Ok(LogOutput::StdErr { message }) => {
                        append_capped(&mut stderr, &message, cap)
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(container_id, error = %err, "failed to collect logs");
                        break;
                    }
                }
            }
        };

        if timeout(Duration::from_secs(LOG_COLLECT_TIMEOUT_SECS), drain)
            .await
            .is_err()
        {
            tracing::warn!(container_id, "log collection deadline elapsed");
        }

        (stdout, stderr)
    }

    async fn remove(&self, container_id: &str) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };
        self.docker
            .remove_container(container_id, Some(options))
            .await
            .map_err(runtime_err)
    }
}

fn runtime_err(err: bollard::errors::Error) -> RuntimeError {
    RuntimeError(err.to_string())
}

/// Appends a log frame unless the buffer already reached the cap; excess
/// bytes are discarded, not buffered.
fn append_capped(buffer: &mut String, chunk: &[u8], cap: usize) {
    if buffer.len() >= cap {
        return;
    }
    buffer.push_str(&String::from_utf8_lossy(chunk));
}
