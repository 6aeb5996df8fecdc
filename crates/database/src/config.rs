//! Database configuration.

use ripple_reactive::SchedulerConfig;

/// Default name prefix for notification worker threads.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "ripple-notify";

/// Options for [`Database`](crate::Database).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Where change deliveries and live query re-executions run.
    pub scheduler: SchedulerConfig,
    /// Worker threads are named `{thread_name_prefix}-{i}`.
    pub thread_name_prefix: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration that delivers changes on the writing thread.
    pub fn immediate() -> Self {
        Self {
            scheduler: SchedulerConfig::Immediate,
            ..Self::default()
        }
    }

    /// Configuration with a worker pool of `threads` threads.
    pub fn worker_pool(threads: usize) -> Self {
        Self {
            scheduler: SchedulerConfig::WorkerPool {
                threads: Some(threads),
            },
            ..Self::default()
        }
    }
}
