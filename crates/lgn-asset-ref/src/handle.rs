use std::{
    any::Any,
    fmt,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Condvar, Mutex, PoisonError, RwLock,
    },
};

use tracing::error;

use crate::{AssetId, AssetType, LoadBehavior, LoadError, ResolveError};

/// Load state of an asset record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum LoadStatus {
    /// No load was dispatched yet.
    Unloaded = 0,
    /// A load is in flight.
    Loading = 1,
    /// The asset data is available.
    Ready = 2,
    /// The last load failed.
    Error = 3,
}

impl LoadStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Loading,
            2 => Self::Ready,
            3 => Self::Error,
            _ => Self::Unloaded,
        }
    }

    /// Returns true for `Ready` and `Error`.
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

/// Shared record holding the state and data of one asset.
///
/// There is at most one live record per [`AssetId`] in a registry. Dropping
/// the last strong reference posts the id on the unload channel so the
/// registry can erase its entry.
pub struct AssetData {
    id: AssetId,
    asset_type: AssetType,
    status: AtomicU8,
    // Guards status transitions observed by blocking waiters.
    signal: (Mutex<()>, Condvar),
    payload: RwLock<Option<Arc<dyn Any + Send + Sync>>>,
    error: Mutex<Option<LoadError>>,
    unload_tx: Option<crossbeam_channel::Sender<AssetId>>,
}

impl AssetData {
    pub(crate) fn new(
        id: AssetId,
        asset_type: AssetType,
        unload_tx: Option<crossbeam_channel::Sender<AssetId>>,
    ) -> Self {
        Self {
            id,
            asset_type,
            status: AtomicU8::new(LoadStatus::Unloaded as u8),
            signal: (Mutex::new(()), Condvar::new()),
            payload: RwLock::new(None),
            error: Mutex::new(None),
            unload_tx,
        }
    }

    /// Returns the id of the asset.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Returns the type the record was created with.
    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    /// Returns the current load status.
    pub fn status(&self) -> LoadStatus {
        LoadStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Moves `Unloaded` to `Loading`. Exactly one concurrent caller wins.
    pub(crate) fn try_begin_load(&self) -> bool {
        self.status
            .compare_exchange(
                LoadStatus::Unloaded as u8,
                LoadStatus::Loading as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Starts a new load cycle on a completed record.
    pub(crate) fn try_begin_reload(&self) -> bool {
        let _guard = self.signal.0.lock().unwrap_or_else(PoisonError::into_inner);
        [LoadStatus::Ready, LoadStatus::Error]
            .into_iter()
            .any(|from| {
                self.status
                    .compare_exchange(
                        from as u8,
                        LoadStatus::Loading as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
            })
    }

    pub(crate) fn complete(&self, payload: Arc<dyn Any + Send + Sync>) {
        *self
            .payload
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(payload);
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.finish(LoadStatus::Ready);
    }

    pub(crate) fn fail(&self, err: LoadError) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
        self.finish(LoadStatus::Error);
    }

    fn finish(&self, status: LoadStatus) {
        let (lock, cvar) = &self.signal;
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.status.store(status as u8, Ordering::Release);
        cvar.notify_all();
    }

    /// Blocks the calling thread while a load is in flight.
    pub fn wait(&self) -> LoadStatus {
        let (lock, cvar) = &self.signal;
        let mut guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.status() == LoadStatus::Loading {
            guard = cvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
        self.status()
    }

    /// Returns the loaded data if the record is `Ready`.
    pub fn payload(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        if self.status() != LoadStatus::Ready {
            return None;
        }
        self.payload
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the error of the last failed load.
    pub fn error(&self) -> Option<LoadError> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for AssetData {
    fn drop(&mut self) {
        if let Some(unload_tx) = &self.unload_tx {
            let _res = unload_tx.send(self.id);
        }
    }
}

impl fmt::Debug for AssetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetData")
            .field("id", &self.id)
            .field("asset_type", &self.asset_type)
            .field("status", &self.status())
            .finish()
    }
}

/// Reference to an asset as held by an owning object.
///
/// A handle carries the identity of the referenced asset, an advisory hint,
/// the load behavior requested for it and, once resolved, the shared
/// [`AssetData`] record. Clones share the record. Two handles are equal when
/// their ids are equal.
#[derive(Clone, Default)]
pub struct AssetHandle {
    id: AssetId,
    asset_type: AssetType,
    hint: String,
    load_behavior: LoadBehavior,
    data: Option<Arc<AssetData>>,
}

impl AssetHandle {
    /// Creates an unbound handle.
    pub fn new(id: AssetId, asset_type: AssetType) -> Self {
        Self {
            id,
            asset_type,
            ..Self::default()
        }
    }

    /// Sets the hint of a new handle.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Sets the load behavior of a new handle.
    #[must_use]
    pub fn with_load_behavior(mut self, load_behavior: LoadBehavior) -> Self {
        self.load_behavior = load_behavior;
        self
    }

    pub(crate) fn from_data(
        data: Arc<AssetData>,
        hint: impl Into<String>,
        load_behavior: LoadBehavior,
    ) -> Self {
        Self {
            id: data.id(),
            asset_type: data.asset_type(),
            hint: hint.into(),
            load_behavior,
            data: Some(data),
        }
    }

    /// Handle returned when nothing could service a request.
    pub(crate) fn invalid(asset_type: AssetType, load_behavior: LoadBehavior) -> Self {
        Self {
            asset_type,
            load_behavior,
            ..Self::default()
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn set_hint(&mut self, hint: impl Into<String>) {
        self.hint = hint.into();
    }

    /// Load behavior requested when this reference is resolved.
    pub fn auto_load_behavior(&self) -> LoadBehavior {
        self.load_behavior
    }

    pub fn set_auto_load_behavior(&mut self, load_behavior: LoadBehavior) {
        self.load_behavior = load_behavior;
    }

    /// Returns the shared record if the handle is bound.
    pub fn data(&self) -> Option<&Arc<AssetData>> {
        self.data.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    /// Status of the bound record, `Unloaded` when unbound.
    pub fn status(&self) -> LoadStatus {
        self.data
            .as_ref()
            .map_or(LoadStatus::Unloaded, |data| data.status())
    }

    pub fn is_ready(&self) -> bool {
        self.status() == LoadStatus::Ready
    }

    pub fn is_error(&self) -> bool {
        self.status() == LoadStatus::Error
    }

    /// Returns the error of the last failed load of the bound record.
    pub fn load_error(&self) -> Option<LoadError> {
        self.data.as_ref().and_then(|data| data.error())
    }

    /// Returns the loaded data as `T` when the asset is ready.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get_untyped()
            .and_then(|payload| payload.downcast::<T>().ok())
    }

    /// Returns the loaded data when the asset is ready.
    pub fn get_untyped(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.data.as_ref().and_then(|data| data.payload())
    }

    /// Waits until the bound load is complete.
    ///
    /// Returns immediately if no load was ever dispatched for this handle.
    pub fn block_until_load_complete(&self) -> LoadStatus {
        match &self.data {
            None => {
                error!(
                    "Cannot wait on asset {} ('{}'): no asset data is bound",
                    self.id, self.hint
                );
                LoadStatus::Unloaded
            }
            Some(data) if data.status() == LoadStatus::Unloaded => {
                error!(
                    "Cannot wait on asset {} ('{}'): load was never requested",
                    self.id, self.hint
                );
                LoadStatus::Unloaded
            }
            Some(data) => data.wait(),
        }
    }

    /// Rewrites the identity of an unbound handle.
    ///
    /// The hint is replaced only when one is given.
    ///
    /// # Errors
    ///
    /// Fails with [`ResolveError::RemapWhileBound`] once asset data is bound.
    pub fn remap(&mut self, id: AssetId, hint: Option<String>) -> Result<(), ResolveError> {
        if self.data.is_some() {
            return Err(ResolveError::RemapWhileBound {
                id: self.id,
                canonical: id,
            });
        }
        self.id = id;
        if let Some(hint) = hint {
            self.hint = hint;
        }
        Ok(())
    }

    /// Sets the identity, releasing the bound record if it belongs to another id.
    pub fn reset(&mut self, id: AssetId, asset_type: AssetType) {
        if self.data.as_ref().map_or(false, |data| data.id() != id) {
            self.data = None;
        }
        self.id = id;
        self.asset_type = asset_type;
    }

    /// Attaches a shared record, keeping the current hint and load behavior.
    pub(crate) fn bind(&mut self, data: Arc<AssetData>) {
        self.id = data.id();
        if !self.asset_type.is_valid() {
            self.asset_type = data.asset_type();
        }
        self.data = Some(data);
    }

    /// Takes the state of a handle returned by a manager.
    pub(crate) fn adopt(&mut self, other: Self) {
        self.id = other.id;
        if other.asset_type.is_valid() {
            self.asset_type = other.asset_type;
        }
        if !other.hint.is_empty() {
            self.hint = other.hint;
        }
        self.data = other.data;
    }

    pub(crate) fn invalidate(&mut self) {
        self.id = AssetId::INVALID;
        self.data = None;
    }

    /// Drops this holder's reference to the shared record.
    pub fn release(&mut self) {
        self.data = None;
    }

    /// Returns true if both handles share the same record.
    pub fn same_data(&self, other: &Self) -> bool {
        match (&self.data, &other.data) {
            (Some(lhs), Some(rhs)) => Arc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AssetHandle {}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle")
            .field("id", &self.id)
            .field("asset_type", &self.asset_type)
            .field("hint", &self.hint)
            .field("load_behavior", &self.load_behavior)
            .field("status", &self.status())
            .finish()
    }
}
