pub mod event_loop;
pub mod serial_queue;
