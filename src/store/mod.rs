//! Rate history backends

pub mod disk;
pub mod memory;

pub use disk::DiskRateHistory;
pub use memory::MemoryRateHistory;
