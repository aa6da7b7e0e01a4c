use std::sync::Mutex;

use crate::blurring::domain::processing_error::ProcessingError;

/// Working memory for one kernel run: an intermediate image for
/// multi-pass blurs and the primitive's temp buffer.
#[derive(Default)]
pub struct ScratchBuffers {
    pub ping: Vec<u8>,
    pub temp: Vec<u8>,
}

impl ScratchBuffers {
    /// Grows both buffers to at least the requested lengths.
    pub fn ensure(&mut self, ping_len: usize, temp_len: usize) -> Result<(), ProcessingError> {
        grow(&mut self.ping, ping_len)?;
        grow(&mut self.temp, temp_len)
    }

    pub fn capacity(&self) -> usize {
        self.ping.capacity() + self.temp.capacity()
    }
}

fn grow(buf: &mut Vec<u8>, len: usize) -> Result<(), ProcessingError> {
    if buf.len() >= len {
        return Ok(());
    }
    buf.try_reserve_exact(len - buf.len())
        .map_err(|_| ProcessingError::Allocation { bytes: len })?;
    buf.resize(len, 0);
    Ok(())
}

struct Slot {
    buffers: Option<ScratchBuffers>,
    generation: u64,
}

/// Instance-owned scratch memory, lazily allocated and releasable at any time.
///
/// A kernel run checks the buffers out so no lock is held while pixels are
/// being pushed. If [`release`](ScratchStore::release) happens meanwhile,
/// the run keeps what it checked out and the buffers are dropped on check-in
/// instead of being stored, so only the next run allocates again.
pub struct ScratchStore {
    slot: Mutex<Slot>,
}

/// Buffers taken out of a [`ScratchStore`], tagged with the store generation.
pub struct CheckedOut {
    pub buffers: ScratchBuffers,
    generation: u64,
}

impl ScratchStore {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                buffers: None,
                generation: 0,
            }),
        }
    }

    pub fn checkout(&self) -> CheckedOut {
        let mut slot = self.lock();
        CheckedOut {
            buffers: slot.buffers.take().unwrap_or_default(),
            generation: slot.generation,
        }
    }

    pub fn checkin(&self, checked_out: CheckedOut) {
        let mut slot = self.lock();
        if slot.generation == checked_out.generation && slot.buffers.is_none() {
            slot.buffers = Some(checked_out.buffers);
        }
    }

    /// Drops retained buffers. Returns the number of bytes freed.
    pub fn release(&self) -> usize {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.buffers.take().map(|b| b.capacity()).unwrap_or(0)
    }

    pub fn allocated_bytes(&self) -> usize {
        self.lock().buffers.as_ref().map(|b| b.capacity()).unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        // The slot holds plain buffers; a panic elsewhere cannot leave it inconsistent.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ScratchStore {
    fn default() -> Self {
        Self::new()
    }
}
