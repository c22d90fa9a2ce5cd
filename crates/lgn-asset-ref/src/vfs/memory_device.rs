use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use super::Device;
use crate::{AssetId, AssetInfo};

/// Device holding asset content in memory, keyed by id.
#[derive(Default)]
pub struct MemoryDevice {
    content: RwLock<HashMap<AssetId, Vec<u8>>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the content of an asset, replacing any previous content.
    pub fn insert(&self, id: AssetId, content: impl Into<Vec<u8>>) {
        self.content
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, content.into());
    }

    pub fn remove(&self, id: AssetId) -> Option<Vec<u8>> {
        self.content
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }
}

impl Device for MemoryDevice {
    fn load(&self, info: &AssetInfo) -> Option<Vec<u8>> {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&info.id)
            .cloned()
    }
}
