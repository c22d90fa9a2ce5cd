//! Asset reference resolution for the runtime data pipeline.
//!
//! Serialized objects refer to assets through *asset references*: an
//! [`AssetId`], an [`AssetType`], an advisory hint and a [`LoadBehavior`].
//! This crate turns such references into live, reference-counted
//! [`AssetHandle`]s.
//!
//! ## Resolving a reference
//!
//! The [`ReferenceResolver`] processes one reference at a time:
//! - an invalid id is an empty slot and resolves trivially,
//! - a caller-supplied [`AssetFilter`] may veto loading, in which case an
//!   already resident asset is still bound,
//! - a legacy id is remapped to its canonical id through the
//!   [`AssetCatalog`],
//! - otherwise a load is requested from the [`AssetManager`], honoring the
//!   load behavior: `NoLoad` stays inert, `QueueLoad` returns immediately and
//!   `PreLoad` waits for the load to complete.
//!
//! ## Deduplication
//!
//! [`AssetRegistry`] is the reference [`AssetManager`]. It keeps one
//! [`AssetData`] record per asset id in an [`AssetHandleRegistry`]; concurrent
//! requests for the same id share the record and dispatch a single load. The
//! record is released when its last handle is dropped.
//!
//! Load outcomes can be polled on the handles or observed as [`AssetEvent`]s
//! through [`AssetRegistry::subscribe`].
//!
//! ## Persisted form
//!
//! The [`serializer`] module reads and writes references in a versioned
//! binary form and in a text form, and feeds what it reads to the resolver.

mod asset_handler;
pub use asset_handler::{AssetHandler, LoadContext};

mod asset_loader;

mod asset_registry;
pub use asset_registry::{AssetRegistry, AssetRegistryOptions};

mod catalog;
pub use catalog::{AssetCatalog, MemoryCatalog};

mod config;
pub use config::{AssetManagerConfig, DEFAULT_FILENAME};

mod errors;
pub use errors::{
    DecodeError, Error, LoadError, ResolveError, Result, SerializeError, TextParseError,
};

mod events;
pub use events::AssetEvent;

pub mod filters;

mod handle;
pub use handle::{AssetData, AssetHandle, LoadStatus};

mod handle_registry;
pub use handle_registry::AssetHandleRegistry;

mod load_behavior;
pub use load_behavior::LoadBehavior;

mod manager;
pub use manager::{AssetFilter, AssetFilterInfo, AssetManager, LoadParameters, LoadPriority};

mod resolver;
pub use resolver::{ReferenceResolver, Resolution};

pub mod serializer;

mod types;
pub use types::{AssetId, AssetInfo, AssetType, InvalidAssetId};

pub mod vfs;
