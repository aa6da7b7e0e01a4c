pub mod async_request;
pub mod blur_error;
pub mod blur_image_processor;
pub mod processor_config;
