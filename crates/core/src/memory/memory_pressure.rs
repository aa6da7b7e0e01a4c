use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

/// Something that can give memory back when the process runs low.
pub trait MemoryPressureListener: Send + Sync {
    fn on_low_memory(&self);
}

struct Entry {
    id: u64,
    listener: Weak<dyn MemoryPressureListener>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Broadcasts the low-memory signal to subscribed listeners.
///
/// Platform glue calls [`signal_low_memory`](MemoryPressureHub::signal_low_memory)
/// when the OS reports pressure. Listeners are held weakly and are never
/// called while the registry lock is held.
#[derive(Default)]
pub struct MemoryPressureHub {
    registry: Mutex<Registry>,
}

static GLOBAL_HUB: OnceLock<Arc<MemoryPressureHub>> = OnceLock::new();

impl MemoryPressureHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The process-wide hub.
    pub fn global() -> Arc<Self> {
        GLOBAL_HUB.get_or_init(Self::new).clone()
    }

    /// Registers `listener` until the returned subscription is dropped.
    pub fn subscribe(
        self: &Arc<Self>,
        listener: Weak<dyn MemoryPressureListener>,
    ) -> MemoryPressureSubscription {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry { id, listener });
        MemoryPressureSubscription {
            hub: Arc::downgrade(self),
            id,
        }
    }

    /// Notifies every live listener. Returns how many were notified.
    pub fn signal_low_memory(&self) -> usize {
        let listeners: Vec<Arc<dyn MemoryPressureListener>> = {
            let mut registry = self.lock();
            registry
                .entries
                .retain(|entry| entry.listener.strong_count() > 0);
            registry
                .entries
                .iter()
                .filter_map(|entry| entry.listener.upgrade())
                .collect()
        };
        log::info!("Low-memory signal: notifying {} listeners", listeners.len());
        for listener in &listeners {
            listener.on_low_memory();
        }
        listeners.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn unsubscribe(&self, id: u64) {
        self.lock().entries.retain(|entry| entry.id != id);
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Keeps a listener registered; unsubscribes on drop.
pub struct MemoryPressureSubscription {
    hub: Weak<MemoryPressureHub>,
    id: u64,
}

impl Drop for MemoryPressureSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}
