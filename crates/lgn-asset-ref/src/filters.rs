//! Ready-made [`AssetFilter`] callbacks.

use std::{collections::HashSet, sync::Arc};

use crate::{AssetFilter, AssetFilterInfo, AssetType, LoadBehavior};

/// Rejects every reference: nothing gets loaded, resident assets still bind.
pub fn no_asset_loading() -> AssetFilter {
    Arc::new(|_info: &AssetFilterInfo| false)
}

/// Accepts only references of the given types.
pub fn only_types(types: impl IntoIterator<Item = AssetType>) -> AssetFilter {
    let types: HashSet<AssetType> = types.into_iter().collect();
    Arc::new(move |info: &AssetFilterInfo| types.contains(&info.asset_type))
}

/// Rejects references of the given types.
pub fn exclude_types(types: impl IntoIterator<Item = AssetType>) -> AssetFilter {
    let types: HashSet<AssetType> = types.into_iter().collect();
    Arc::new(move |info: &AssetFilterInfo| !types.contains(&info.asset_type))
}

/// Rejects references explicitly marked [`LoadBehavior::NoLoad`].
pub fn skip_no_load() -> AssetFilter {
    Arc::new(|info: &AssetFilterInfo| info.load_behavior != LoadBehavior::NoLoad)
}
