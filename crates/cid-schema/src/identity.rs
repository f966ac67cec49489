use crate::image::Image;
use crate::manifest::ManifestError;
use crate::types::{ImageChecksum, NormalForm, ShortId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which checksum of an image to compute or verify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumVariant {
    /// Structural and runtime content only.
    #[default]
    Manifest,
    /// Manifest content plus raw extended metadata.
    Extended,
}

impl ChecksumVariant {
    pub fn compute(self, image: &Image) -> ImageChecksum {
        match self {
            Self::Manifest => image.manifest_checksum(),
            Self::Extended => image.extended_checksum(),
        }
    }
}

impl fmt::Display for ChecksumVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manifest => "manifest",
            Self::Extended => "extended",
        })
    }
}

impl FromStr for ChecksumVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manifest" => Ok(Self::Manifest),
            "extended" => Ok(Self::Extended),
            other => Err(format!(
                "unknown checksum variant '{other}' (expected 'manifest' or 'extended')"
            )),
        }
    }
}

/// Every identifier derived from an image, computed in one pass.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageIdentity {
    pub normal_form: NormalForm,
    pub manifest_checksum: ImageChecksum,
    pub extended_checksum: ImageChecksum,
    pub short_id: ShortId,
}

impl Image {
    pub fn identity(&self) -> ImageIdentity {
        let manifest_checksum = self.manifest_checksum();
        ImageIdentity {
            normal_form: self.normal_form(),
            short_id: manifest_checksum.short_id(),
            extended_checksum: self.extended_checksum(),
            manifest_checksum,
        }
    }
}

/// Recompute a checksum and compare it to a stored one.
///
/// The comparison ignores ASCII case and surrounding whitespace of `expected`.
pub fn verify_checksum(
    image: &Image,
    expected: &str,
    variant: ChecksumVariant,
) -> Result<ImageChecksum, ManifestError> {
    let computed = variant.compute(image);
    if !computed.matches(expected) {
        return Err(ManifestError::ChecksumMismatch {
            expected: expected.trim().to_owned(),
            computed: computed.into_inner(),
        });
    }
    Ok(computed)
}
