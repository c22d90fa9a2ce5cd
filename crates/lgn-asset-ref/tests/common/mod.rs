#![allow(dead_code)]

use std::{
    any::Any,
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use lgn_asset_ref::{
    serializer::AssetSerializer, vfs, AssetHandler, AssetId, AssetInfo, AssetManagerConfig,
    AssetRegistry, AssetRegistryOptions, AssetType, LoadBehavior, LoadContext, MemoryCatalog,
    ReferenceResolver,
};

pub const TEXT: AssetType = AssetType::from_u128(0x5445_5854_0000_0000_0000_0000_0000_0001);
pub const UNHANDLED: AssetType = AssetType::from_u128(0xdead_0000_0000_0000_0000_0000_0000_0002);

/// Content a [`TextHandler`] refuses to load.
pub const CORRUPT: &str = "<corrupt>";

/// Loads UTF-8 text assets, recording every load.
pub struct TextHandler {
    delay: Duration,
    default_behavior: LoadBehavior,
    loads: AtomicUsize,
    contexts: Mutex<Vec<LoadContext>>,
}

impl TextHandler {
    pub fn new(delay: Duration, default_behavior: LoadBehavior) -> Self {
        Self {
            delay,
            default_behavior,
            loads: AtomicUsize::new(0),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn loaded_ids(&self) -> Vec<AssetId> {
        self.contexts().iter().map(|context| context.id).collect()
    }

    /// Context of every load, in call order.
    pub fn contexts(&self) -> Vec<LoadContext> {
        self.contexts.lock().unwrap().clone()
    }
}

impl AssetHandler for TextHandler {
    fn asset_type(&self) -> AssetType {
        TEXT
    }

    fn load(
        &self,
        context: &LoadContext,
        reader: &mut dyn io::Read,
    ) -> io::Result<Box<dyn Any + Send + Sync>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().unwrap().push(context.clone());
        thread::sleep(self.delay);

        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        if content == CORRUPT {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt text"));
        }
        Ok(Box::new(content))
    }

    fn default_load_behavior(&self) -> LoadBehavior {
        self.default_behavior
    }
}

/// Memory device shared between a fixture and its registry.
struct SharedDevice(Arc<vfs::MemoryDevice>);

impl vfs::Device for SharedDevice {
    fn load(&self, info: &AssetInfo) -> Option<Vec<u8>> {
        self.0.load(info)
    }
}

pub struct Fixture {
    pub registry: Arc<AssetRegistry>,
    pub catalog: Arc<MemoryCatalog>,
    pub device: Arc<vfs::MemoryDevice>,
    pub handler: Arc<TextHandler>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(
            AssetManagerConfig::default(),
            Duration::ZERO,
            LoadBehavior::QueueLoad,
        )
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self::with(AssetManagerConfig::default(), delay, LoadBehavior::QueueLoad)
    }

    pub fn with(
        config: AssetManagerConfig,
        handler_delay: Duration,
        default_behavior: LoadBehavior,
    ) -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let device = Arc::new(vfs::MemoryDevice::new());
        let handler = Arc::new(TextHandler::new(handler_delay, default_behavior));

        let registry = AssetRegistryOptions::new()
            .add_handler(handler.clone())
            .add_device(Box::new(SharedDevice(device.clone())))
            .with_catalog(catalog.clone())
            .with_config(config)
            .create();

        Self {
            registry,
            catalog,
            device,
            handler,
        }
    }

    /// Registers a text asset in the catalog and stores its content.
    pub fn add_asset(&self, relative_path: &str, content: &str) -> AssetId {
        let id = AssetId::generate(0);
        self.catalog
            .register(AssetInfo::new(id, TEXT, relative_path));
        self.device.insert(id, content);
        id
    }

    /// Declares a new legacy id for `canonical`.
    pub fn add_legacy_id(&self, canonical: AssetId) -> AssetId {
        let legacy = AssetId::generate(canonical.sub_id());
        self.catalog.register_legacy(legacy, canonical);
        legacy
    }

    pub fn resolver(&self) -> ReferenceResolver {
        ReferenceResolver::new(self.registry.clone(), Some(self.catalog.clone()))
    }

    pub fn serializer(&self) -> AssetSerializer {
        AssetSerializer::new(self.resolver())
    }

    pub fn dispatch_count(&self) -> usize {
        self.registry.load_dispatch_count()
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
