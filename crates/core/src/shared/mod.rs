pub mod constants;
pub mod image;
pub mod processor_id;
