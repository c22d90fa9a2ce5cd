use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    AssetCatalog, AssetFilter, AssetFilterInfo, AssetHandle, AssetManager, LoadBehavior,
    LoadError, LoadParameters, LoadStatus, ResolveError,
};

/// Fate of a reference after resolution.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resolution {
    /// The reference slot is empty.
    Empty,
    /// The filter vetoed loading. `bound` tells whether a resident asset was
    /// attached anyway.
    Filtered { bound: bool },
    /// The handle already carried ready data.
    AlreadyResident,
    /// `NoLoad`: the handle stays unloaded until loaded explicitly.
    Deferred,
    /// A load is in flight; its outcome is observed later on the handle.
    Queued,
    /// Blocking load completed successfully.
    Loaded,
}

impl Resolution {
    /// Returns true if the handle is bound to a record.
    pub fn is_bound(self) -> bool {
        matches!(
            self,
            Self::Filtered { bound: true } | Self::AlreadyResident | Self::Queued | Self::Loaded
        )
    }
}

/// Turns decoded asset references into live handles.
///
/// The resolver decides, for each reference, whether to bind to an already
/// resident asset, skip loading on the caller's request, remap a legacy id,
/// or request a load honoring the reference's [`LoadBehavior`].
pub struct ReferenceResolver {
    manager: Arc<dyn AssetManager>,
    catalog: Option<Arc<dyn AssetCatalog>>,
}

impl ReferenceResolver {
    pub fn new(manager: Arc<dyn AssetManager>, catalog: Option<Arc<dyn AssetCatalog>>) -> Self {
        Self { manager, catalog }
    }

    /// Resolves `handle` in place.
    ///
    /// The handle id and hint may be rewritten by a legacy id remap, and the
    /// handle gets bound to the shared asset record.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NoHandler`] if nothing can load the asset type. The
    ///   handle id is left invalid.
    /// - [`ResolveError::LoadFailed`] if a blocking load completed in error.
    /// - [`ResolveError::RemapWhileBound`] if a legacy id must be remapped on a
    ///   handle that is already bound.
    pub fn resolve(
        &self,
        handle: &mut AssetHandle,
        filter: Option<&AssetFilter>,
    ) -> Result<Resolution, ResolveError> {
        if !handle.id().is_valid() {
            return Ok(Resolution::Empty);
        }

        if let Some(filter) = filter {
            if !filter(&AssetFilterInfo::from_handle(handle)) {
                return Ok(Resolution::Filtered {
                    bound: self.bind_resident(handle),
                });
            }
        }

        self.remap_legacy_id(handle)?;

        if handle.get_untyped().is_some() {
            return Ok(Resolution::AlreadyResident);
        }

        let load_behavior = LoadBehavior::resolve(
            Some(handle.auto_load_behavior()),
            self.manager.default_load_behavior(handle.asset_type()),
        );
        if load_behavior == LoadBehavior::NoLoad {
            return Ok(Resolution::Deferred);
        }

        let params = LoadParameters::with_filter(filter.cloned());
        let loaded = self.manager.get_asset(
            handle.id(),
            handle.asset_type(),
            handle.auto_load_behavior(),
            &params,
        );
        if !loaded.id().is_valid() {
            let (id, asset_type) = (handle.id(), handle.asset_type());
            handle.invalidate();
            error!(
                "Failed to retrieve required asset {} of type {}: no handler was registered",
                id, asset_type
            );
            return Err(ResolveError::NoHandler { id, asset_type });
        }
        handle.adopt(loaded);

        if !load_behavior.is_blocking() {
            return Ok(Resolution::Queued);
        }

        if self.manager.block_until_load_complete(handle) == LoadStatus::Error {
            let source = handle
                .load_error()
                .unwrap_or(LoadError::ContentNotFound(handle.id()));
            error!(
                "Failed to load asset {} ('{}'): {}",
                handle.id(),
                handle.hint(),
                source
            );
            return Err(ResolveError::LoadFailed {
                id: handle.id(),
                hint: handle.hint().to_owned(),
                source,
            });
        }
        Ok(Resolution::Loaded)
    }

    /// Attaches a resident record to a filtered reference, without touching
    /// its hint.
    fn bind_resident(&self, handle: &mut AssetHandle) -> bool {
        let resident = self
            .manager
            .find_asset(handle.id(), handle.auto_load_behavior());
        let data = match resident.data() {
            Some(data) => data.clone(),
            None => return false,
        };
        let type_matches =
            !handle.asset_type().is_valid() || data.asset_type() == handle.asset_type();
        if !type_matches {
            return false;
        }
        debug!("Filtered asset {} bound to resident data", handle.id());
        handle.bind(data);
        true
    }

    fn remap_legacy_id(&self, handle: &mut AssetHandle) -> Result<(), ResolveError> {
        let info = match &self.catalog {
            Some(catalog) => catalog.asset_info_by_id(handle.id()),
            None => None,
        };
        match info {
            Some(info) if info.id.is_valid() && info.id != handle.id() => {
                debug!("Remapping legacy asset id {} to {}", handle.id(), info.id);
                let hint = (!info.relative_path.is_empty()).then(|| info.relative_path);
                handle.remap(info.id, hint)
            }
            _ => Ok(()),
        }
    }
}
