use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use tracing::debug;

use crate::{events::EventDispatcher, AssetData, AssetEvent, AssetId, AssetType};

/// Table of live asset records, keyed by id.
///
/// The table holds weak references only: a record lives as long as some
/// handle, or an in-flight load request, holds it. Dropped records post their
/// id on the unload channel and are erased by [`Self::collect_dropped`].
pub struct AssetHandleRegistry {
    entries: Mutex<HashMap<AssetId, Weak<AssetData>>>,
    unload_channel: (
        crossbeam_channel::Sender<AssetId>,
        crossbeam_channel::Receiver<AssetId>,
    ),
    events: Option<Arc<EventDispatcher>>,
}

impl Default for AssetHandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetHandleRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            unload_channel: crossbeam_channel::unbounded(),
            events: None,
        }
    }

    /// Registry announcing erased entries as [`AssetEvent::Unloaded`].
    pub(crate) fn with_events(events: Arc<EventDispatcher>) -> Self {
        Self {
            events: Some(events),
            ..Self::new()
        }
    }

    /// Returns the live record of `id`, never creating one.
    pub fn find(&self, id: AssetId) -> Option<Arc<AssetData>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .and_then(Weak::upgrade)
    }

    /// Returns the live record of `id`, creating it if needed.
    ///
    /// The boolean is true when the record was created by this call.
    pub fn find_or_create(&self, id: AssetId, asset_type: AssetType) -> (Arc<AssetData>, bool) {
        self.collect_dropped();

        let mut stale = None;
        let result = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let existing = entries.get(&id).and_then(Weak::upgrade);
            if let Some(data) = existing {
                (data, false)
            } else {
                let data = Arc::new(AssetData::new(
                    id,
                    asset_type,
                    Some(self.unload_channel.0.clone()),
                ));
                stale = entries.insert(id, Arc::downgrade(&data));
                (data, true)
            }
        };
        drop(stale);

        if result.1 {
            debug!("Registered asset {} of type {}", id, asset_type);
        }
        result
    }

    /// Erases the entries whose records were dropped.
    ///
    /// Returns the number of erased entries. An entry that was re-created
    /// since its old record dropped is kept.
    pub fn collect_dropped(&self) -> usize {
        let dropped: Vec<AssetId> = self.unload_channel.1.try_iter().collect();
        if dropped.is_empty() {
            return 0;
        }

        let mut erased = Vec::with_capacity(dropped.len());
        {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            for id in dropped {
                let is_dead = entries
                    .get(&id)
                    .map_or(false, |weak| weak.strong_count() == 0);
                if is_dead {
                    entries.remove(&id);
                    erased.push(id);
                    debug!("Collected asset {}", id);
                }
            }
        }

        if let Some(events) = &self.events {
            for id in &erased {
                events.send(&AssetEvent::Unloaded(*id));
            }
        }
        erased.len()
    }

    /// Number of entries whose record is still alive.
    pub fn resident_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Number of entries, dead or alive, currently in the table.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
