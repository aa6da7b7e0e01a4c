use std::sync::Arc;

use crate::blurring::domain::box_convolver::BoxConvolver;
use crate::blurring::infrastructure::cpu_box_convolver::CpuBoxConvolver;
use crate::delivery::notification_center::NotificationCenter;
use crate::memory::memory_pressure::MemoryPressureHub;
use crate::shared::constants::DEFAULT_QUEUE_NAME;

/// Collaborators of a [`BlurImageProcessor`](super::blur_image_processor::BlurImageProcessor).
///
/// The default uses the CPU box convolver and the process-wide
/// notification center and memory-pressure hub.
#[derive(Clone)]
pub struct ProcessorConfig {
    pub queue_name: String,
    pub convolver: Arc<dyn BoxConvolver>,
    pub notifications: Arc<NotificationCenter>,
    pub memory_pressure: Arc<MemoryPressureHub>,
}

impl ProcessorConfig {
    pub fn with_queue_name(mut self, name: impl Into<String>) -> Self {
        self.queue_name = name.into();
        self
    }

    pub fn with_convolver(mut self, convolver: Arc<dyn BoxConvolver>) -> Self {
        self.convolver = convolver;
        self
    }

    pub fn with_notifications(mut self, center: Arc<NotificationCenter>) -> Self {
        self.notifications = center;
        self
    }

    pub fn with_memory_pressure(mut self, hub: Arc<MemoryPressureHub>) -> Self {
        self.memory_pressure = hub;
        self
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
            convolver: Arc::new(CpuBoxConvolver::new()),
            notifications: NotificationCenter::global(),
            memory_pressure: MemoryPressureHub::global(),
        }
    }
}
