use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tracing::{debug, error, warn};

use crate::{
    asset_handler::{AssetHandler, LoadContext},
    asset_loader::{AssetLoader, LoadRequest},
    events::EventDispatcher,
    vfs, AssetCatalog, AssetData, AssetEvent, AssetHandle, AssetHandleRegistry, AssetId,
    AssetInfo, AssetManager, AssetManagerConfig, AssetType, LoadBehavior, LoadParameters,
};

/// Options which can be used to configure the creation of [`AssetRegistry`].
pub struct AssetRegistryOptions {
    handlers: HashMap<AssetType, Arc<dyn AssetHandler>>,
    devices: Vec<Box<dyn vfs::Device>>,
    catalog: Option<Arc<dyn AssetCatalog>>,
    config: AssetManagerConfig,
}

impl AssetRegistryOptions {
    /// Creates a blank set of options for [`AssetRegistry`] configuration.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            devices: vec![],
            catalog: None,
            config: AssetManagerConfig::default(),
        }
    }

    /// Enables support of an [`AssetType`] by adding its [`AssetHandler`].
    #[must_use]
    pub fn add_handler(mut self, handler: Arc<dyn AssetHandler>) -> Self {
        self.handlers.insert(handler.asset_type(), handler);
        self
    }

    /// Mounts a device the loader reads content from. Devices are queried in
    /// the order they were added.
    #[must_use]
    pub fn add_device(mut self, device: Box<dyn vfs::Device>) -> Self {
        self.devices.push(device);
        self
    }

    /// Specifying `directory device` will mount a device that allows to read
    /// assets from a specified directory.
    #[must_use]
    pub fn add_device_dir(self, path: impl AsRef<Path>) -> Self {
        self.add_device(Box::new(vfs::DirDevice::new(path)))
    }

    /// Catalog used to canonicalize ids and locate content.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn AssetCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: AssetManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates [`AssetRegistry`] based on `AssetRegistryOptions`.
    pub fn create(self) -> Arc<AssetRegistry> {
        let events = Arc::new(EventDispatcher::default());
        let loader = AssetLoader::new(self.devices, &self.config, events.clone());

        Arc::new(AssetRegistry {
            handlers: self.handlers,
            catalog: self.catalog,
            config: self.config,
            handles: AssetHandleRegistry::with_events(events.clone()),
            loader,
            events,
            dispatch_count: AtomicUsize::new(0),
        })
    }
}

/// Reference [`AssetManager`]: deduplicates requests through an
/// [`AssetHandleRegistry`] and loads content on a pool of loader threads.
///
/// The lifetime of a loaded asset is determined by the reference counted
/// [`AssetHandle`]s bound to it.
pub struct AssetRegistry {
    handlers: HashMap<AssetType, Arc<dyn AssetHandler>>,
    catalog: Option<Arc<dyn AssetCatalog>>,
    config: AssetManagerConfig,
    handles: AssetHandleRegistry,
    loader: AssetLoader,
    events: Arc<EventDispatcher>,
    dispatch_count: AtomicUsize,
}

impl AssetRegistry {
    pub fn config(&self) -> &AssetManagerConfig {
        &self.config
    }

    /// Total number of load requests dispatched to the loader.
    pub fn load_dispatch_count(&self) -> usize {
        self.dispatch_count.load(Ordering::Acquire)
    }

    /// Number of assets with a live record.
    pub fn resident_count(&self) -> usize {
        self.handles.resident_count()
    }

    /// Returns a receiver of every [`AssetEvent`] posted from now on.
    ///
    /// `Ready`, `Reloaded` and `Error` are posted by the loader threads once
    /// the record state is updated. `Unloaded` is posted when a released
    /// record is collected.
    pub fn subscribe(&self) -> crossbeam_channel::Receiver<AssetEvent> {
        self.events.subscribe()
    }

    /// Erases the registry entries of released assets.
    pub fn collect_dropped(&self) -> usize {
        self.handles.collect_dropped()
    }

    /// Trigger a reload of a resident asset.
    ///
    /// Returns false if the asset is not resident, or is loading already.
    pub fn reload(&self, id: AssetId) -> bool {
        let data = match self.handles.find(id) {
            Some(data) => data,
            None => return false,
        };
        let handler = match self.handlers.get(&data.asset_type()) {
            Some(handler) => handler.clone(),
            None => return false,
        };
        if !data.try_begin_reload() {
            return false;
        }
        let info = self.storage_info(id, data.asset_type());
        self.dispatch(data, info, handler, &LoadParameters::default(), true);
        true
    }

    fn catalog_info(&self, id: AssetId) -> Option<AssetInfo> {
        self.catalog
            .as_ref()
            .and_then(|catalog| catalog.asset_info_by_id(id))
            .filter(|info| info.id.is_valid())
    }

    fn storage_info(&self, id: AssetId, asset_type: AssetType) -> AssetInfo {
        self.catalog_info(id)
            .filter(|info| info.id == id)
            .unwrap_or_else(|| AssetInfo::new(id, asset_type, ""))
    }

    fn dispatch(
        &self,
        data: Arc<AssetData>,
        info: AssetInfo,
        handler: Arc<dyn AssetHandler>,
        params: &LoadParameters,
        reload: bool,
    ) {
        let context = LoadContext {
            id: data.id(),
            asset_type: data.asset_type(),
            relative_path: info.relative_path.clone(),
            filter: params.filter.clone(),
            deadline: params.deadline,
            priority: params.priority,
        };
        self.dispatch_count.fetch_add(1, Ordering::AcqRel);
        debug!("Dispatching load of asset {}", data.id());
        self.loader.dispatch(LoadRequest {
            data,
            info,
            handler,
            context,
            reload,
        });
    }
}

impl AssetManager for AssetRegistry {
    fn find_asset(&self, id: AssetId, load_behavior: LoadBehavior) -> AssetHandle {
        let id = if self.config.asset_info_upgrading {
            self.catalog_info(id).map_or(id, |info| info.id)
        } else {
            id
        };
        match self.handles.find(id) {
            Some(data) => AssetHandle::from_data(data, "", load_behavior),
            None => AssetHandle::new(id, AssetType::INVALID).with_load_behavior(load_behavior),
        }
    }

    fn get_asset(
        &self,
        id: AssetId,
        asset_type: AssetType,
        load_behavior: LoadBehavior,
        params: &LoadParameters,
    ) -> AssetHandle {
        if !id.is_valid() {
            error!("GetAsset called with invalid asset id (type {})", asset_type);
            return AssetHandle::invalid(asset_type, load_behavior);
        }

        // Operate on the canonical id when `id` is a legacy id.
        let info = match self.catalog_info(id) {
            Some(mut info) => {
                if !info.asset_type.is_valid() {
                    info.asset_type = asset_type;
                } else if asset_type.is_valid() && info.asset_type != asset_type {
                    warn!(
                        "Requested asset {} with type {}, but type is actually {}",
                        id, asset_type, info.asset_type
                    );
                }
                info
            }
            None => {
                if self.catalog.is_some() {
                    warn!(
                        "Asset {} does not exist in the asset catalog, it may be missing or not processed",
                        id
                    );
                }
                AssetInfo::new(id, asset_type, "")
            }
        };

        let handler = match self.handlers.get(&info.asset_type) {
            Some(handler) => handler.clone(),
            None => {
                error!(
                    "No handler was registered for this asset [type:{} id:{}]",
                    info.asset_type, info.id
                );
                return AssetHandle::invalid(asset_type, load_behavior);
            }
        };

        let (data, _created) = self.handles.find_or_create(info.id, info.asset_type);
        let handle = AssetHandle::from_data(data.clone(), info.relative_path.clone(), load_behavior);

        if data.try_begin_load() {
            self.dispatch(data, info, handler, params, false);
        }

        handle
    }

    fn default_load_behavior(&self, asset_type: AssetType) -> LoadBehavior {
        self.handlers
            .get(&asset_type)
            .map_or(LoadBehavior::QueueLoad, |handler| {
                handler.default_load_behavior()
            })
    }
}
