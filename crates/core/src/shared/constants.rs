/// Posted after an async blur finishes; payload under [`BLURRED_IMAGE_KEY`].
pub const IMAGE_READY_NOTIFICATION: &str = "blurkit.image_ready";
pub const BLURRED_IMAGE_KEY: &str = "blurred_image";

/// Posted after an async blur fails; payload under [`ERROR_CODE_KEY`].
pub const PROCESSING_ERROR_NOTIFICATION: &str = "blurkit.processing_error";
pub const ERROR_CODE_KEY: &str = "error_code";

/// Name of the per-processor worker thread.
pub const DEFAULT_QUEUE_NAME: &str = "blurkit-serial";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
