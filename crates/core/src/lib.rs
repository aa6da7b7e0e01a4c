pub mod blurring;
pub mod caching;
pub mod delivery;
pub mod dispatch;
pub mod imaging;
pub mod memory;
pub mod processor;
pub mod shared;
