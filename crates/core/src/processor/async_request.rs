use std::sync::Arc;

use crate::blurring::domain::blur_params::BlurParams;
use crate::blurring::domain::processing_error::ErrorCode;
use crate::delivery::result_fanout::{ErrorCallback, SuccessCallback};
use crate::dispatch::domain::execution_context::ExecutionContext;
use crate::shared::image::Image;

/// An asynchronous blur call and where its outcome goes.
///
/// `context` is the caller's execution context: the delegate, the
/// callbacks and the notification for this request all run there.
pub struct AsyncBlurRequest {
    pub(crate) params: BlurParams,
    pub(crate) context: Arc<dyn ExecutionContext>,
    pub(crate) cancel_last_operation: bool,
    pub(crate) on_success: Option<SuccessCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl AsyncBlurRequest {
    pub fn new(radius: u32, iterations: u8, context: Arc<dyn ExecutionContext>) -> Self {
        Self {
            params: BlurParams::new(radius, iterations),
            context,
            cancel_last_operation: false,
            on_success: None,
            on_error: None,
        }
    }

    /// Cancel the newest still-waiting request before queueing this one.
    /// Ignored when nothing is waiting.
    pub fn cancel_last_operation(mut self, cancel: bool) -> Self {
        self.cancel_last_operation = cancel;
        self
    }

    pub fn on_success(mut self, callback: impl FnOnce(Arc<Image>) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnOnce(ErrorCode) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }
}
