use std::sync::{Arc, Mutex, Weak};

use crate::blurring::domain::processing_error::ErrorCode;
use crate::shared::constants::{
    BLURRED_IMAGE_KEY, ERROR_CODE_KEY, IMAGE_READY_NOTIFICATION, PROCESSING_ERROR_NOTIFICATION,
};
use crate::shared::image::Image;
use crate::shared::processor_id::ProcessorId;

use super::blur_event::{BlurEvent, BlurProcessorDelegate};
use super::notification_center::{Notification, NotificationCenter, NotificationValue};

pub type SuccessCallback = Box<dyn FnOnce(Arc<Image>) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(ErrorCode) + Send>;

/// The processor's delegate slot, read at delivery time.
pub type DelegateSlot = Arc<Mutex<Option<Weak<dyn BlurProcessorDelegate>>>>;

/// One destination for a request's outcome. Consumed by a single delivery.
pub trait BlurEventSink: Send {
    fn consume(self: Box<Self>, processor: ProcessorId, event: &BlurEvent);
}

/// Forwards to whatever delegate is registered when the event arrives.
pub struct DelegateSink {
    slot: DelegateSlot,
}

impl DelegateSink {
    pub fn new(slot: DelegateSlot) -> Self {
        Self { slot }
    }
}

impl BlurEventSink for DelegateSink {
    fn consume(self: Box<Self>, processor: ProcessorId, event: &BlurEvent) {
        let delegate = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .and_then(Weak::upgrade);
        let Some(delegate) = delegate else {
            return;
        };
        match event {
            BlurEvent::Ready(image) => delegate.on_blurred_image(processor, image.clone()),
            BlurEvent::Failed(code) => delegate.on_processing_error(processor, *code),
        }
    }
}

/// Per-request callbacks; only the one matching the outcome runs.
pub struct CallbackSink {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl CallbackSink {
    pub fn new(on_success: Option<SuccessCallback>, on_error: Option<ErrorCallback>) -> Self {
        Self {
            on_success,
            on_error,
        }
    }
}

impl BlurEventSink for CallbackSink {
    fn consume(self: Box<Self>, _processor: ProcessorId, event: &BlurEvent) {
        match event {
            BlurEvent::Ready(image) => {
                if let Some(callback) = self.on_success {
                    callback(image.clone());
                }
            }
            BlurEvent::Failed(code) => {
                if let Some(callback) = self.on_error {
                    callback(*code);
                }
            }
        }
    }
}

/// Posts the ready / error notification.
pub struct NotificationSink {
    center: Arc<NotificationCenter>,
}

impl NotificationSink {
    pub fn new(center: Arc<NotificationCenter>) -> Self {
        Self { center }
    }
}

impl BlurEventSink for NotificationSink {
    fn consume(self: Box<Self>, processor: ProcessorId, event: &BlurEvent) {
        let notification = match event {
            BlurEvent::Ready(image) => Notification::new(IMAGE_READY_NOTIFICATION, processor)
                .with(BLURRED_IMAGE_KEY, NotificationValue::Image(image.clone())),
            BlurEvent::Failed(code) => Notification::new(PROCESSING_ERROR_NOTIFICATION, processor)
                .with(ERROR_CODE_KEY, NotificationValue::ErrorCode(*code)),
        };
        self.center.post(&notification);
    }
}

/// Ordered set of sinks that all receive the same single event.
pub struct ResultFanout {
    processor: ProcessorId,
    sinks: Vec<Box<dyn BlurEventSink>>,
}

impl ResultFanout {
    pub fn new(processor: ProcessorId) -> Self {
        Self {
            processor,
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: impl BlurEventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Hands `event` to every sink in registration order.
    pub fn deliver(self, event: BlurEvent) {
        log::debug!(
            "{}: delivering {} to {} sinks",
            self.processor,
            if event.is_ready() { "image" } else { "error" },
            self.sinks.len()
        );
        for sink in self.sinks {
            sink.consume(self.processor, &event);
        }
    }
}
