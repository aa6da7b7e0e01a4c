pub mod blur_event;
pub mod notification_center;
pub mod result_fanout;
