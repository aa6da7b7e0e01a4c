use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::dispatch::domain::execution_context::{ExecutionContext, Task};

/// A run loop owned by one thread.
///
/// Contexts handed out by [`context`](EventLoop::context) only enqueue;
/// tasks run when the owning thread pumps the loop. Passing such a context
/// with an async blur request makes its callbacks run on the pumping
/// thread, the same way a UI main loop would.
pub struct EventLoop {
    tx: Sender<Task>,
    rx: Receiver<Task>,
}

struct EventLoopContext {
    tx: Sender<Task>,
}

impl ExecutionContext for EventLoopContext {
    fn dispatch(&self, task: Task) -> bool {
        self.tx.send(task).is_ok()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn context(&self) -> Arc<dyn ExecutionContext> {
        Arc::new(EventLoopContext {
            tx: self.tx.clone(),
        })
    }

    /// Runs every task already queued. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for one task and runs it.
    pub fn run_one(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Pumps tasks until `done` returns true or `timeout` elapses.
    /// Returns the final value of `done`.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while !done() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return done();
            }
            self.run_one(remaining);
        }
        true
    }

    pub fn queued(&self) -> usize {
        self.rx.len()
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
