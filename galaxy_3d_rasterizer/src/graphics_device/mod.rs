/// Graphics device module - GPU driver seam and its value types

pub mod graphics_device;

pub use graphics_device::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
