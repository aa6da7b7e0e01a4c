use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use crate::dispatch::domain::execution_context::Task;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Task>,
    running: bool,
    shutdown: bool,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        !self.running && self.pending.is_empty()
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<QueueState>,
    work: Condvar,
    idle: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A single worker thread running jobs one at a time in submission order.
///
/// Jobs that have not started can be cancelled (the newest one, or all of
/// them); a cancelled job is removed and dropped without running. A started
/// job always runs to completion. Dropping the queue discards pending jobs
/// and joins the worker after the current job.
///
/// Removed jobs are dropped after the queue lock is released, so whatever
/// they captured may call back into the queue from its `Drop`.
pub struct SerialQueue {
    name: String,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl SerialQueue {
    pub fn new(name: &str) -> io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(&worker_shared))?;
        let worker_id = worker.thread().id();
        Ok(Self {
            name: name.to_string(),
            shared,
            worker: Some(worker),
            worker_id,
        })
    }

    /// Appends `task` to the queue.
    pub fn submit(&self, task: Task) {
        let mut state = self.shared.lock();
        state.pending.push_back(task);
        log::debug!("{}: queued job ({} pending)", self.name, state.pending.len());
        drop(state);
        self.shared.work.notify_one();
    }

    /// Cancels the most recently submitted job that has not started.
    /// Returns `false` when nothing was waiting.
    pub fn cancel_last(&self) -> bool {
        let cancelled = {
            let mut state = self.shared.lock();
            let cancelled = state.pending.pop_back();
            if state.is_idle() {
                self.shared.idle.notify_all();
            }
            cancelled
        };
        match cancelled {
            Some(job) => {
                drop(job);
                log::debug!("{}: cancelled last queued job", self.name);
                true
            }
            None => false,
        }
    }

    /// Cancels every job that has not started. Returns how many were dropped.
    pub fn cancel_all(&self) -> usize {
        let cancelled: Vec<Task> = {
            let mut state = self.shared.lock();
            let cancelled = state.pending.drain(..).collect();
            if state.is_idle() {
                self.shared.idle.notify_all();
            }
            cancelled
        };
        let count = cancelled.len();
        drop(cancelled);
        if count > 0 {
            log::debug!("{}: cancelled {count} queued jobs", self.name);
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Blocks until nothing is queued or running. Returns `false` on timeout.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        while !state.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            state = match self.shared.idle.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        let discarded: Vec<Task> = {
            let mut state = self.shared.lock();
            state.shutdown = true;
            state.pending.drain(..).collect()
        };
        self.shared.work.notify_all();
        if !discarded.is_empty() {
            log::debug!(
                "{}: discarded {} queued jobs on shutdown",
                self.name,
                discarded.len()
            );
        }
        drop(discarded);

        if thread::current().id() == self.worker_id {
            return;
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("{}: worker thread panicked", self.name);
            }
        }
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let task = {
            let mut state = shared.lock();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(task) = state.pending.pop_front() {
                    state.running = true;
                    break task;
                }
                state = match shared.work.wait(state) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
            }
        };

        if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
            log::error!("Queued job panicked; continuing with the next one");
        }

        let mut state = shared.lock();
        state.running = false;
        if state.is_idle() {
            shared.idle.notify_all();
        }
    }
}
