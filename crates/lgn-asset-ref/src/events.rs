use std::sync::{Mutex, PoisonError};

use crate::{AssetId, LoadError};

/// Lifecycle notification of an asset record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetEvent {
    /// The first load of the asset completed.
    Ready(AssetId),
    /// A load or a reload completed in error.
    Error(AssetId, LoadError),
    /// A reload completed, the record carries the new data.
    Reloaded(AssetId),
    /// The last handle was released and the registry entry erased.
    Unloaded(AssetId),
}

impl AssetEvent {
    pub fn id(&self) -> AssetId {
        match self {
            Self::Ready(id) | Self::Error(id, _) | Self::Reloaded(id) | Self::Unloaded(id) => *id,
        }
    }
}

/// Fans events out to every live subscriber.
///
/// Subscribers whose receiver was dropped are forgotten on the next send.
#[derive(Default)]
pub(crate) struct EventDispatcher {
    subscribers: Mutex<Vec<crossbeam_channel::Sender<AssetEvent>>>,
}

impl EventDispatcher {
    pub(crate) fn subscribe(&self) -> crossbeam_channel::Receiver<AssetEvent> {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event_tx);
        event_rx
    }

    pub(crate) fn send(&self, event: &AssetEvent) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|event_tx| event_tx.send(event.clone()).is_ok());
    }
}
