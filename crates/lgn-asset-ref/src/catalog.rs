use std::{
    collections::HashMap,
    io,
    path::Path,
    sync::{PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::{AssetId, AssetInfo, Result};

/// Lookup of storage information by asset id.
///
/// A catalog also knows about legacy ids: looking up an obsolete id returns
/// the info of its current canonical id. Absence means "unknown asset".
pub trait AssetCatalog: Send + Sync {
    /// Returns the info of `id`, following legacy ids to their canonical asset.
    fn asset_info_by_id(&self, id: AssetId) -> Option<AssetInfo>;
}

/// On-disk form of a [`MemoryCatalog`].
#[derive(Serialize, Deserialize, Debug, Default)]
struct CatalogFile {
    assets: Vec<AssetInfo>,
    #[serde(default)]
    legacy: Vec<(AssetId, AssetId)>,
}

/// In-memory catalog, optionally loaded from a JSON file.
///
/// ```json
/// {
///   "assets": [{ "id": "{GUID}:0", "asset_type": "{GUID}", "relative_path": "a/b.bin" }],
///   "legacy": [["{OLD}:0", "{GUID}:0"]]
/// }
/// ```
#[derive(Default)]
pub struct MemoryCatalog {
    assets: RwLock<HashMap<AssetId, AssetInfo>>,
    legacy: RwLock<HashMap<AssetId, AssetId>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the info of an asset.
    pub fn register(&self, info: AssetInfo) {
        self.assets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.id, info);
    }

    /// Declares `legacy` as an obsolete id of `canonical`.
    pub fn register_legacy(&self, legacy: AssetId, canonical: AssetId) {
        self.legacy
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(legacy, canonical);
    }

    /// Builds a catalog from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self::from_file(file))
    }

    /// Reads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = io::BufReader::new(std::fs::File::open(path)?);
        let file: CatalogFile = serde_json::from_reader(reader)?;
        Ok(Self::from_file(file))
    }

    /// Returns the JSON form of the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let mut file = CatalogFile {
            assets: self
                .assets
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .cloned()
                .collect(),
            legacy: self
                .legacy
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(legacy, canonical)| (*legacy, *canonical))
                .collect(),
        };
        file.assets.sort_by_key(|info| info.id);
        file.legacy.sort();
        Ok(serde_json::to_string_pretty(&file)?)
    }

    fn from_file(file: CatalogFile) -> Self {
        let catalog = Self::new();
        for info in file.assets {
            catalog.register(info);
        }
        for (legacy, canonical) in file.legacy {
            catalog.register_legacy(legacy, canonical);
        }
        catalog
    }

    fn canonical_id(&self, id: AssetId) -> AssetId {
        self.legacy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(id)
    }
}

impl AssetCatalog for MemoryCatalog {
    fn asset_info_by_id(&self, id: AssetId) -> Option<AssetInfo> {
        let canonical = self.canonical_id(id);
        let assets = self.assets.read().unwrap_or_else(PoisonError::into_inner);
        match assets.get(&canonical) {
            Some(info) => Some(info.clone()),
            // A legacy mapping is enough to know the canonical id.
            None if canonical != id => Some(AssetInfo {
                id: canonical,
                ..AssetInfo::default()
            }),
            None => None,
        }
    }
}
