pub mod blur_params;
pub mod box_convolver;
pub mod processing_error;
