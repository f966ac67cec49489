use crate::canonical::Canonical;
use crate::manifest::nullable;
use serde::{Deserialize, Serialize};

/// Filesystem layer lineage of an image: an optional parent plus its own layers.
///
/// `checksums` is in stacking order and is never reordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FsLayers {
    #[serde(default)]
    pub base: Option<ImageBase>,
    #[serde(default, deserialize_with = "nullable")]
    pub checksums: Vec<String>,
}

/// An image from which another shares filesystem layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageBase {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub checksum: String,
}

impl Canonical for FsLayers {
    fn canonical_values(&self) -> Vec<String> {
        let mut values = Vec::with_capacity(self.checksums.len() + 4);

        // A missing base contributes nothing, not four empty strings.
        if let Some(base) = &self.base {
            values.extend([
                base.domain.clone(),
                base.path.clone(),
                base.version.clone(),
                base.checksum.clone(),
            ]);
        }

        values.extend(self.checksums.iter().cloned());
        values
    }
}
