//! Storage devices the loader reads asset content from.

mod dir_device;
mod memory_device;

pub use dir_device::DirDevice;
pub use memory_device::MemoryDevice;

use crate::AssetInfo;

/// Source of asset content.
pub trait Device: Send + Sync {
    /// Returns the content of the asset, or `None` if the device does not hold it.
    fn load(&self, info: &AssetInfo) -> Option<Vec<u8>>;
}
