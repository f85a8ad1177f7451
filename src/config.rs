use std::env;
use std::str::FromStr;

use crate::constants::DEFAULT_MAX_OUTPUT_BYTES;

/// Worker configuration sourced from the environment.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Maximum number of submissions judged in parallel. Each slot consumes
    /// a full CPU core and a memory ceiling on the host.
    pub pool_size: usize,
    /// Capacity of the job queue feeding the pool.
    pub queue_capacity: usize,
    /// Per-stream byte cap for container output.
    pub max_output_bytes: usize,
    pub images: ImageConfig,
}

/// Sandbox image per supported language.
#[derive(Clone, Debug)]
pub struct ImageConfig {
    pub cpp: String,
    pub java: String,
    pub python: String,
    pub javascript: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            cpp: "judge-cpp:latest".to_string(),
            java: "judge-java:latest".to_string(),
            python: "judge-python:latest".to_string(),
            javascript: "judge-javascript:latest".to_string(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            queue_capacity: 100,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            images: ImageConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pool_size: env_or("EXECUTION_MAX_CONCURRENT", defaults.pool_size),
            queue_capacity: env_or("EXECUTION_QUEUE_CAPACITY", defaults.queue_capacity),
            max_output_bytes: env_or("EXECUTION_OUTPUT_MAX_SIZE", defaults.max_output_bytes),
            images: ImageConfig {
                cpp: env_or_string("DOCKER_IMAGE_CPP", defaults.images.cpp),
                java: env_or_string("DOCKER_IMAGE_JAVA", defaults.images.java),
                python: env_or_string("DOCKER_IMAGE_PYTHON", defaults.images.python),
                javascript: env_or_string("DOCKER_IMAGE_JAVASCRIPT", defaults.images.javascript),
            },
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

fn env_or_string(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}
