pub mod memory_pressure;
