/// Per-stream byte cap applied while draining container logs.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10_240;

/// Cap for the verdict message carried on the submission.
pub const FINAL_MESSAGE_CAP: usize = 1000;

/// Cap for the diagnostic input/expected/actual fields stored per test case.
pub const OUTCOME_FIELD_CAP: usize = 100;

/// Extra wall-clock seconds allowed past the declared time limit before the
/// container is forcibly terminated.
pub const WAIT_GRACE_SECS: u64 = 5;

/// Deadline for log collection, independent of the execution deadline.
pub const LOG_COLLECT_TIMEOUT_SECS: u64 = 5;

/// Deadline for the kill and remove runtime calls; a stalled daemon RPC
/// must not hang the worker slot.
pub const FORCE_STOP_TIMEOUT_SECS: u64 = 5;

/// Grace period for draining in-flight jobs on shutdown.
pub const SHUTDOWN_GRACE_SECS: u64 = 60;

/// Process/thread ceiling inside the sandbox.
pub const PIDS_LIMIT: i64 = 100;

/// cpu_quota == cpu_period pins the container to one logical core.
pub const CPU_QUOTA: i64 = 100_000;
pub const CPU_PERIOD: i64 = 100_000;

pub const DEFAULT_TIME_LIMIT_SECS: u64 = 5;
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 256;

/// Mount point of the per-execution workspace inside the container.
pub const WORKSPACE_MOUNT: &str = "/workspace";

/// Driver script baked into every language image. Invoked with the time
/// limit in seconds as its sole argument.
pub const DRIVER_COMMAND: &str = "/judge/run.sh";

pub const INPUT_FILE_NAME: &str = "input.txt";

pub const TRUNCATED_MARKER: &str = "\n... (truncated)";
pub const OUTPUT_TRUNCATED_MARKER: &str = "\n... (output truncated)";

pub const POOL_ACQUIRE_ERR: &str = "worker pool semaphore closed";
