pub mod cpu_box_convolver;
pub mod kernel_runner;
pub mod scratch_buffers;
