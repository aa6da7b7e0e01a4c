use std::sync::Arc;

use crate::blurring::domain::processing_error::ErrorCode;
use crate::shared::image::Image;
use crate::shared::processor_id::ProcessorId;

/// Outcome of one completed async blur request.
#[derive(Clone, Debug)]
pub enum BlurEvent {
    Ready(Arc<Image>),
    Failed(ErrorCode),
}

impl BlurEvent {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Observer of a processor's async results. Both methods are optional.
///
/// Methods are called on the execution context the request was issued from.
pub trait BlurProcessorDelegate: Send + Sync {
    fn on_blurred_image(&self, _processor: ProcessorId, _image: Arc<Image>) {}

    fn on_processing_error(&self, _processor: ProcessorId, _code: ErrorCode) {}
}
