//! Execution contexts for change deliveries.
//!
//! The change bus hands each delivery to a `Scheduler`:
//!
//! - `Immediate` runs the delivery on the publishing thread before
//!   `publish` returns. Deterministic, useful for tests and single-threaded
//!   callers.
//! - `Pool` queues the delivery on a fixed pool of worker threads so the
//!   writer never waits for subscriber re-queries.
//!
//! ```text
//!   publish ──► job queue ──► ┌──────────────┐
//!                             │  worker 0..N  │  (compete for jobs)
//!                             └──────────────┘
//! ```

use log::{debug, warn};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, available_parallelism, JoinHandle};

/// Minimum number of worker threads.
const MIN_WORKER_THREADS: usize = 1;

/// Maximum number of worker threads.
const MAX_WORKER_THREADS: usize = 8;

/// A unit of work handed to a scheduler.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// How change deliveries are executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedulerConfig {
    /// Run deliveries on the publishing thread.
    Immediate,
    /// Run deliveries on a worker pool. `None` picks the available
    /// parallelism.
    WorkerPool { threads: Option<usize> },
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig::WorkerPool { threads: None }
    }
}

/// Executes jobs according to a [`SchedulerConfig`].
pub enum Scheduler {
    Immediate,
    Pool(WorkerPool),
}

impl Scheduler {
    /// Builds a scheduler. Worker threads are named `{name_prefix}-{i}`.
    pub fn from_config(config: &SchedulerConfig, name_prefix: &str) -> Self {
        match config {
            SchedulerConfig::Immediate => Scheduler::Immediate,
            SchedulerConfig::WorkerPool { threads } => {
                Scheduler::Pool(WorkerPool::spawn(*threads, name_prefix))
            }
        }
    }

    /// Runs `job` now or queues it, depending on the scheduler.
    pub fn spawn(&self, job: Job) {
        match self {
            Scheduler::Immediate => job(),
            Scheduler::Pool(pool) => pool.execute(job),
        }
    }

    /// Number of worker threads; zero for the immediate scheduler.
    pub fn thread_count(&self) -> usize {
        match self {
            Scheduler::Immediate => 0,
            Scheduler::Pool(pool) => pool.thread_count(),
        }
    }
}

/// A fixed pool of threads sharing one job queue.
///
/// Whichever worker is free picks up the next job. Dropping the pool closes
/// the queue; workers finish the jobs already queued and exit.
pub struct WorkerPool {
    job_tx: Mutex<Option<Sender<Job>>>,
    thread_handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the pool. `threads` is clamped to `[1, 8]`; `None` uses the
    /// available parallelism.
    pub fn spawn(threads: Option<usize>, name_prefix: &str) -> Self {
        let count = threads.unwrap_or_else(|| {
            available_parallelism()
                .map(|n| n.get())
                .unwrap_or(MIN_WORKER_THREADS)
        });
        let count = count.clamp(MIN_WORKER_THREADS, MAX_WORKER_THREADS);

        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut thread_handles = Vec::with_capacity(count);
        for i in 0..count {
            let rx = Arc::clone(&job_rx);
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", name_prefix, i))
                .spawn(move || run_worker(rx));
            match spawned {
                Ok(handle) => thread_handles.push(handle),
                Err(e) => warn!("failed to spawn worker {}-{}: {}", name_prefix, i, e),
            }
        }
        debug!("worker pool '{}' started with {} threads", name_prefix, thread_handles.len());

        Self {
            job_tx: Mutex::new(Some(job_tx)),
            thread_handles,
        }
    }

    /// Queues a job. Jobs run inline if no worker could be started.
    pub fn execute(&self, job: Job) {
        if self.thread_handles.is_empty() {
            job();
            return;
        }
        let rejected = match self.job_tx.lock().as_ref() {
            Some(tx) => tx.send(job).err().map(|e| e.0),
            None => Some(job),
        };
        if rejected.is_some() {
            warn!("worker pool is shut down, dropping job");
        }
    }

    /// Number of worker threads in the pool.
    pub fn thread_count(&self) -> usize {
        self.thread_handles.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the sender ends every worker loop once the queue drains.
        self.job_tx.lock().take();
        let current = thread::current().id();
        for handle in self.thread_handles.drain(..) {
            // A pool dropped from one of its own jobs cannot join itself.
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

fn run_worker(job_rx: Arc<Mutex<Receiver<Job>>>) {
    loop {
        // Threads compete for the lock; the holder waits for the next job.
        let job = {
            let rx = job_rx.lock();
            rx.recv()
        };
        match job {
            Ok(job) => {
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    warn!("job panicked on worker thread");
                }
            }
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_immediate_runs_inline() {
        let scheduler = Scheduler::from_config(&SchedulerConfig::Immediate, "test");
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();
        scheduler.spawn(Box::new(move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.thread_count(), 0);
    }

    #[test]
    fn test_pool_runs_jobs() {
        let scheduler = Scheduler::from_config(
            &SchedulerConfig::WorkerPool { threads: Some(3) },
            "test-pool",
        );
        assert_eq!(scheduler.thread_count(), 3);

        let (tx, rx) = mpsc::channel();
        for i in 0..10 {
            let tx = tx.clone();
            scheduler.spawn(Box::new(move || {
                tx.send(i).unwrap();
            }));
        }

        let mut seen: Vec<i32> = (0..10)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_pool_thread_count_clamped() {
        let pool = WorkerPool::spawn(Some(0), "clamp-low");
        assert_eq!(pool.thread_count(), MIN_WORKER_THREADS);
        let pool = WorkerPool::spawn(Some(100), "clamp-high");
        assert_eq!(pool.thread_count(), MAX_WORKER_THREADS);
    }

    #[test]
    fn test_pool_survives_panicking_job() {
        let pool = WorkerPool::spawn(Some(1), "panicky");
        pool.execute(Box::new(|| panic!("job failure")));

        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || tx.send(()).unwrap()));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_drop_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::spawn(Some(2), "drain");
            for _ in 0..50 {
                let counter = counter.clone();
                pool.execute(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_default_config_is_pool() {
        assert_eq!(
            SchedulerConfig::default(),
            SchedulerConfig::WorkerPool { threads: None }
        );
    }
}
