use std::io;

use thiserror::Error;

use crate::{AssetId, AssetType};

/// Failure to decode the binary form of an asset reference.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("stream too short for version {version}: {required} bytes required, {available} available")]
    StreamTooShort {
        version: u32,
        required: usize,
        available: usize,
    },
    #[error("invalid load behavior value: {0}")]
    InvalidLoadBehavior(u32),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Failure to parse the text form of an asset reference.
#[derive(Error, Debug)]
pub enum TextParseError {
    #[error("expected '{expected}' at offset {offset}")]
    MissingDelimiter { expected: &'static str, offset: usize },
    #[error("invalid guid: {0}")]
    InvalidGuid(#[from] uuid::Error),
    #[error("invalid sub id: '{0}'")]
    InvalidSubId(String),
    #[error("invalid load behavior: '{0}'")]
    InvalidLoadBehavior(String),
    #[error("missing load behavior field")]
    MissingLoadBehavior,
}

/// Outcome of a dispatched load that did not produce asset data.
///
/// Kept on the shared asset record so every holder can observe it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("no device holds content for asset {0}")]
    ContentNotFound(AssetId),
    #[error("handler failed to load asset {id}: {reason}")]
    HandlerFailed { id: AssetId, reason: String },
    #[error("load of asset {0} failed on request")]
    Forced(AssetId),
    #[error("loader terminated before asset {0} was loaded")]
    Terminated(AssetId),
}

/// Failure to resolve an asset reference to a live handle.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no handler was registered for asset {id} of type {asset_type}")]
    NoHandler { id: AssetId, asset_type: AssetType },
    #[error("failed to load asset {id} ('{hint}'): {source}")]
    LoadFailed {
        id: AssetId,
        hint: String,
        #[source]
        source: LoadError,
    },
    #[error("cannot remap asset {id} to {canonical} while asset data is bound")]
    RemapWhileBound { id: AssetId, canonical: AssetId },
}

/// Failure of a serializer front-end operation.
#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("text parse error: {0}")]
    Text(#[from] TextParseError),
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
}

/// An error type for the asset-ref crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
    #[error("catalog error: {0}")]
    Catalog(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

/// A result type that can be used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
