use std::{any::Any, io, time::Duration};

use crate::{AssetFilter, AssetId, AssetType, LoadBehavior, LoadPriority};

/// Context of one load, handed to the [`AssetHandler`].
#[derive(Clone)]
pub struct LoadContext {
    pub id: AssetId,
    pub asset_type: AssetType,
    /// Catalog path of the asset, empty when unknown.
    pub relative_path: String,
    /// Filter to apply to references found in the asset content.
    pub filter: Option<AssetFilter>,
    pub deadline: Option<Duration>,
    pub priority: Option<LoadPriority>,
}

/// Creates asset data of one [`AssetType`] from raw content.
///
/// Handlers run on loader threads.
pub trait AssetHandler: Send + Sync {
    /// Type of the assets this handler loads.
    fn asset_type(&self) -> AssetType;

    /// Interprets the content of an asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid asset.
    fn load(
        &self,
        context: &LoadContext,
        reader: &mut dyn io::Read,
    ) -> io::Result<Box<dyn Any + Send + Sync>>;

    /// Behavior of references to this type that do not persist one.
    fn default_load_behavior(&self) -> LoadBehavior {
        LoadBehavior::QueueLoad
    }
}
