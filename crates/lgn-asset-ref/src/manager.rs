use std::{fmt, sync::Arc, time::Duration};

use crate::{AssetHandle, AssetId, AssetType, LoadBehavior, LoadStatus};

/// Metadata handed to a filter for each reference about to be loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetFilterInfo {
    pub id: AssetId,
    pub asset_type: AssetType,
    pub load_behavior: LoadBehavior,
    pub hint: String,
}

impl AssetFilterInfo {
    /// Describes the reference carried by `handle`.
    pub fn from_handle(handle: &AssetHandle) -> Self {
        Self {
            id: handle.id(),
            asset_type: handle.asset_type(),
            load_behavior: handle.auto_load_behavior(),
            hint: handle.hint().to_owned(),
        }
    }
}

/// Caller-supplied predicate vetoing automatic loading of a reference.
///
/// Returning `false` skips the load; an already resident asset may still be
/// bound.
pub type AssetFilter = Arc<dyn Fn(&AssetFilterInfo) -> bool + Send + Sync>;

/// Relative importance of a load request.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum LoadPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Options attached to a load request.
#[derive(Clone, Default)]
pub struct LoadParameters {
    /// Filter applied to the dependencies of the loaded asset.
    pub filter: Option<AssetFilter>,
    /// Time the caller is ready to wait for the asset.
    pub deadline: Option<Duration>,
    pub priority: Option<LoadPriority>,
}

impl LoadParameters {
    /// Parameters carrying only a filter.
    pub fn with_filter(filter: Option<AssetFilter>) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

impl fmt::Debug for LoadParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadParameters")
            .field("filter", &self.filter.is_some())
            .field("deadline", &self.deadline)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Service orchestrating asset loads.
///
/// Implementations deduplicate requests: concurrent calls to
/// [`AssetManager::get_asset`] for one id dispatch at most one load and share
/// one record.
pub trait AssetManager: Send + Sync {
    /// Returns a handle bound to the resident record of `id`, or an unbound
    /// handle. Never starts a load.
    fn find_asset(&self, id: AssetId, load_behavior: LoadBehavior) -> AssetHandle;

    /// Returns a handle bound to the record of `id`, dispatching a load if none
    /// was dispatched yet.
    ///
    /// The returned handle has an invalid id when no handler is registered for
    /// `asset_type`.
    fn get_asset(
        &self,
        id: AssetId,
        asset_type: AssetType,
        load_behavior: LoadBehavior,
        params: &LoadParameters,
    ) -> AssetHandle;

    /// Waits for the load bound to `handle` to complete.
    fn block_until_load_complete(&self, handle: &AssetHandle) -> LoadStatus {
        handle.block_until_load_complete()
    }

    /// Behavior of references of `asset_type` that do not persist one.
    fn default_load_behavior(&self, _asset_type: AssetType) -> LoadBehavior {
        LoadBehavior::QueueLoad
    }
}
