//! Serializer front-end of asset references.
//!
//! An asset reference is persisted as a four-tuple: id, type, hint and load
//! behavior. Fields were added over time, so every read is gated by the
//! version the data was written with:
//!
//! - version 0: id and type,
//! - version 1: adds the hint,
//! - version 2: adds the load behavior.
//!
//! Decoded references are applied to an [`AssetHandle`] and resolved through a
//! [`ReferenceResolver`].

pub mod binary;
pub mod text;

use tracing::debug;

use crate::{
    AssetFilter, AssetHandle, AssetId, AssetType, LoadBehavior, ReferenceResolver, Resolution,
    SerializeError,
};

/// Version written by this crate.
pub const CURRENT_VERSION: u32 = 2;

/// Maximum number of hint bytes kept when reading.
pub const MAX_HINT_LENGTH: usize = 1024;

/// Byte order of binary data.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Endianness {
    Little,
    Big,
}

impl Default for Endianness {
    fn default() -> Self {
        Self::Little
    }
}

/// Persisted shape of a reference field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetReference {
    pub id: AssetId,
    pub asset_type: AssetType,
    pub hint: String,
    pub load_behavior: LoadBehavior,
}

impl From<&AssetHandle> for AssetReference {
    fn from(handle: &AssetHandle) -> Self {
        Self {
            id: handle.id(),
            asset_type: handle.asset_type(),
            hint: handle.hint().to_owned(),
            load_behavior: handle.auto_load_behavior(),
        }
    }
}

/// Fields read from persisted data.
///
/// Fields absent from the version that was read are `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedReference {
    pub id: AssetId,
    pub asset_type: AssetType,
    pub hint: Option<String>,
    pub load_behavior: Option<LoadBehavior>,
    /// The persisted hint was longer than [`MAX_HINT_LENGTH`].
    pub hint_truncated: bool,
}

impl DecodedReference {
    /// Writes the decoded fields into `handle`.
    ///
    /// A handle bound to another asset is released first. Fields that were not
    /// persisted keep the value the handle already had.
    pub fn apply_to(&self, handle: &mut AssetHandle) {
        handle.reset(self.id, self.asset_type);
        if let Some(hint) = &self.hint {
            handle.set_hint(hint.clone());
        }
        if let Some(load_behavior) = self.load_behavior {
            handle.set_auto_load_behavior(load_behavior);
        }
    }

    /// Reference with defaults for the fields that were not persisted.
    pub fn to_reference(&self) -> AssetReference {
        AssetReference {
            id: self.id,
            asset_type: self.asset_type,
            hint: self.hint.clone().unwrap_or_default(),
            load_behavior: self.load_behavior.unwrap_or_default(),
        }
    }
}

/// Options of a batch load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadFlags {
    /// Any failing field fails the whole batch.
    pub strict: bool,
}

/// Result of [`AssetSerializer::load_batch`].
#[derive(Debug)]
pub struct BatchReport {
    /// Resolution of every field that loaded, by field index.
    pub resolutions: Vec<(usize, Resolution)>,
    /// Error of every field that failed, by field index.
    pub failures: Vec<(usize, SerializeError)>,
    strict: bool,
}

impl BatchReport {
    /// A lenient batch succeeds even if some fields failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() || !self.strict
    }
}

/// Reads and writes asset reference fields, resolving what it reads.
pub struct AssetSerializer {
    resolver: ReferenceResolver,
}

impl AssetSerializer {
    pub fn new(resolver: ReferenceResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Binary form of `handle` at the current version.
    pub fn save(&self, handle: &AssetHandle, endianness: Endianness) -> Vec<u8> {
        binary::encode(&AssetReference::from(handle), endianness)
    }

    /// Reads a binary reference into `target` and resolves it.
    ///
    /// # Errors
    ///
    /// A decode failure leaves `target` untouched. A resolution failure is
    /// reported after the decoded fields were applied.
    pub fn load(
        &self,
        target: &mut AssetHandle,
        data: &[u8],
        version: u32,
        endianness: Endianness,
    ) -> Result<Resolution, SerializeError> {
        self.load_with_filter(target, data, version, endianness, None)
    }

    /// Same as [`Self::load`], with a filter vetoing loads.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_filter(
        &self,
        target: &mut AssetHandle,
        data: &[u8],
        version: u32,
        endianness: Endianness,
        filter: Option<&AssetFilter>,
    ) -> Result<Resolution, SerializeError> {
        let decoded = binary::decode(data, version, endianness)?;
        self.apply_and_resolve(target, &decoded, filter)
    }

    /// Reads a text reference into `target` and resolves it.
    ///
    /// # Errors
    ///
    /// A parse failure leaves `target` untouched.
    pub fn load_text(
        &self,
        target: &mut AssetHandle,
        text: &str,
        version: u32,
        filter: Option<&AssetFilter>,
    ) -> Result<Resolution, SerializeError> {
        let decoded = text::parse(text, version)?;
        self.apply_and_resolve(target, &decoded, filter)
    }

    fn apply_and_resolve(
        &self,
        target: &mut AssetHandle,
        decoded: &DecodedReference,
        filter: Option<&AssetFilter>,
    ) -> Result<Resolution, SerializeError> {
        decoded.apply_to(target);
        let resolution = self.resolver.resolve(target, filter)?;
        debug!("Resolved asset reference {}: {:?}", target.id(), resolution);
        Ok(resolution)
    }

    /// Converts binary data to its text form at the current version.
    ///
    /// # Errors
    ///
    /// Fails if the binary data cannot be decoded.
    pub fn data_to_text(
        &self,
        data: &[u8],
        version: u32,
        endianness: Endianness,
    ) -> Result<String, SerializeError> {
        let decoded = binary::decode(data, version, endianness)?;
        Ok(text::to_text(&decoded.to_reference(), CURRENT_VERSION))
    }

    /// Converts text written at `version` to binary data at the current
    /// version.
    ///
    /// # Errors
    ///
    /// Fails if the text cannot be parsed.
    pub fn text_to_data(
        &self,
        text: &str,
        version: u32,
        endianness: Endianness,
    ) -> Result<Vec<u8>, SerializeError> {
        let decoded = text::parse(text, version)?;
        Ok(binary::encode(&decoded.to_reference(), endianness))
    }

    /// Two reference fields hold the same value when their ids are equal.
    pub fn compare_value_data(lhs: &AssetHandle, rhs: &AssetHandle) -> bool {
        lhs.id() == rhs.id()
    }

    /// Loads every field independently.
    ///
    /// A failing field never stops the batch; [`BatchReport::is_success`]
    /// applies the strictness of `flags`.
    pub fn load_batch<'a>(
        &self,
        fields: impl IntoIterator<Item = (&'a mut AssetHandle, &'a [u8])>,
        version: u32,
        endianness: Endianness,
        filter: Option<&AssetFilter>,
        flags: LoadFlags,
    ) -> BatchReport {
        let mut report = BatchReport {
            resolutions: Vec::new(),
            failures: Vec::new(),
            strict: flags.strict,
        };
        for (index, (target, data)) in fields.into_iter().enumerate() {
            match self.load_with_filter(target, data, version, endianness, filter) {
                Ok(resolution) => report.resolutions.push((index, resolution)),
                Err(err) => report.failures.push((index, err)),
            }
        }
        report
    }
}
