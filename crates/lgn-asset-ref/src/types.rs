use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when parsing an [`AssetId`] or [`AssetType`] from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidAssetId {
    #[error("missing ':' separator between guid and sub id in '{0}'")]
    MissingSeparator(String),
    #[error("invalid guid '{0}'")]
    Guid(String),
    #[error("invalid sub id '{0}'")]
    SubId(String),
}

fn fmt_guid(guid: &Uuid, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut buffer = Uuid::encode_buffer();
    f.write_fmt(format_args!(
        "{{{}}}",
        guid.hyphenated().encode_upper(&mut buffer)
    ))
}

fn parse_guid(s: &str) -> Result<Uuid, InvalidAssetId> {
    Uuid::parse_str(s.trim()).map_err(|_err| InvalidAssetId::Guid(s.to_owned()))
}

/// Identity of a loadable unit of content.
///
/// An asset id is made of:
/// - a 128 bit guid identifying the source asset,
/// - a 32 bit sub id identifying one of the products of that source.
///
/// An id with a nil guid is invalid and models an empty reference slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AssetId {
    guid: Uuid,
    sub_id: u32,
}

impl AssetId {
    /// The invalid asset id.
    pub const INVALID: Self = Self {
        guid: Uuid::nil(),
        sub_id: 0,
    };

    /// Creates an asset id from its parts.
    pub const fn new(guid: Uuid, sub_id: u32) -> Self {
        Self { guid, sub_id }
    }

    /// Creates an asset id with a random guid.
    pub fn generate(sub_id: u32) -> Self {
        Self::new(Uuid::new_v4(), sub_id)
    }

    /// Returns the guid part of the id.
    pub fn guid(&self) -> Uuid {
        self.guid
    }

    /// Returns the sub id part of the id.
    pub fn sub_id(&self) -> u32 {
        self.sub_id
    }

    /// Returns true if the guid is not nil.
    pub fn is_valid(&self) -> bool {
        !self.guid.is_nil()
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_guid(&self.guid, f)?;
        f.write_fmt(format_args!(":{:x}", self.sub_id))
    }
}

impl FromStr for AssetId {
    type Err = InvalidAssetId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (guid, sub_id) = s
            .rsplit_once(':')
            .ok_or_else(|| InvalidAssetId::MissingSeparator(s.to_owned()))?;
        let guid = parse_guid(guid)?;
        let sub_id = sub_id.trim();
        let sub_id = u32::from_str_radix(sub_id.trim_start_matches("0x"), 16)
            .map_err(|_err| InvalidAssetId::SubId(sub_id.to_owned()))?;
        Ok(Self { guid, sub_id })
    }
}

/// Type tag selecting which handler can interpret the bytes of an asset.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AssetType(Uuid);

impl AssetType {
    /// Sentinel meaning "no type known".
    pub const INVALID: Self = Self(Uuid::nil());

    /// Creates an asset type from a guid.
    pub const fn new(guid: Uuid) -> Self {
        Self(guid)
    }

    /// Creates an asset type from a raw 128 bit value.
    pub const fn from_u128(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }

    /// Returns the underlying guid.
    pub fn guid(&self) -> Uuid {
        self.0
    }

    /// Returns true unless this is the [`AssetType::INVALID`] sentinel.
    pub fn is_valid(&self) -> bool {
        !self.0.is_nil()
    }
}

impl Default for AssetType {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_guid(&self.0, f)
    }
}

impl FromStr for AssetType {
    type Err = InvalidAssetId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_guid(s).map(Self)
    }
}

macro_rules! impl_text_serde {
    ($name:ty) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_text_serde!(AssetId);
impl_text_serde!(AssetType);

/// Storage information the catalog keeps about an asset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Canonical id of the asset.
    pub id: AssetId,
    /// Type recorded for the asset.
    pub asset_type: AssetType,
    /// Path of the product relative to the asset root.
    #[serde(default)]
    pub relative_path: String,
    /// Size of the product in bytes.
    #[serde(default)]
    pub size_bytes: u64,
}

impl AssetInfo {
    /// Creates asset info for a product.
    pub fn new(id: AssetId, asset_type: AssetType, relative_path: impl Into<String>) -> Self {
        Self {
            id,
            asset_type,
            relative_path: relative_path.into(),
            size_bytes: 0,
        }
    }
}
