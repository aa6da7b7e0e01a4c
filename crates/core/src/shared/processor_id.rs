use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROCESSOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a blur processor; the sender of its events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcessorId(u64);

impl ProcessorId {
    pub fn next() -> Self {
        Self(NEXT_PROCESSOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "processor#{}", self.0)
    }
}
