use std::path::{Path, PathBuf};

use super::Device;
use crate::AssetInfo;

/// Directory storage device.
///
/// Assets are stored in files at their catalog relative path, or in files
/// named by their id when the path is unknown.
pub struct DirDevice {
    dir: PathBuf,
}

impl DirDevice {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            dir: path.as_ref().to_owned(),
        }
    }
}

impl Device for DirDevice {
    fn load(&self, info: &AssetInfo) -> Option<Vec<u8>> {
        let path = if info.relative_path.is_empty() {
            self.dir.join(format!(
                "{}_{:x}",
                info.id.guid().simple(),
                info.id.sub_id()
            ))
        } else {
            self.dir.join(&info.relative_path)
        };
        std::fs::read(path).ok()
    }
}
