/// A unit of work handed to an [`ExecutionContext`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Where asynchronous results are delivered.
///
/// Each async blur request captures the context of its caller, and every
/// success or error callback for that request runs through it. The serial
/// worker never calls user code directly.
pub trait ExecutionContext: Send + Sync {
    /// Schedules `task`. Returns `false` if the context can no longer run
    /// tasks, in which case `task` has been dropped.
    fn dispatch(&self, task: Task) -> bool;
}
