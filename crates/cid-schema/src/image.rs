use crate::canonical::{Canonical, CanonicalHasher};
use crate::layers::FsLayers;
use crate::runtime::RuntimeParams;
use crate::types::{ImageChecksum, NormalForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// A container image manifest for one OS/architecture/version build.
///
/// `extended_metadata` and `extended_metadata_raw` are two views of the same
/// data and are only brought in sync by [`Image::encode_extended_metadata`] and
/// [`Image::decode_extended_metadata`]. The raw bytes are what gets hashed and
/// what appears on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub version: String,

    #[serde(default, deserialize_with = "date_created::deserialize")]
    pub date_created: DateTime<Utc>,

    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub fs_layers: FsLayers,
    #[serde(default)]
    pub runtime_params: RuntimeParams,

    #[serde(skip)]
    pub extended_metadata: Map<String, Value>,
    #[serde(rename = "extendedMetadata", default, with = "raw_json")]
    pub extended_metadata_raw: Vec<u8>,
}

impl Image {
    /// The image name in normal form:
    ///
    /// ```text
    /// example.com/foo/bar/baz/linux-amd64-3.1.4-a.159
    /// \_________/ \_________/ \___/ \___/ \_________/
    ///      |           |        |     |        |
    ///    domain       path     os   arch    version
    /// ```
    ///
    /// Fields are not escaped, so this is a display key and not an identity.
    pub fn normal_form(&self) -> NormalForm {
        NormalForm::new(format!(
            "{}/{}/{}-{}-{}",
            self.domain, self.path, self.os, self.arch, self.version
        ))
    }

    /// Checksum over the manifest's structural and runtime content.
    pub fn manifest_checksum(&self) -> ImageChecksum {
        let mut hasher = CanonicalHasher::new();
        self.hash_into(&mut hasher);
        let sum = hasher.finalize();
        debug!("manifest checksum for {}: {sum}", self.normal_form());
        sum
    }

    /// Checksum over the manifest plus the raw extended-metadata bytes.
    ///
    /// Equal to [`Image::manifest_checksum`] when the raw bytes are empty.
    pub fn extended_checksum(&self) -> ImageChecksum {
        let mut hasher = CanonicalHasher::new();
        self.hash_into(&mut hasher);
        let sum = hasher.finalize_with_trailer(&self.extended_metadata_raw);
        debug!(
            "extended checksum for {} ({} metadata bytes): {sum}",
            self.normal_form(),
            self.extended_metadata_raw.len()
        );
        sum
    }

    fn own_values(&self) -> [String; 7] {
        [
            self.domain.clone(),
            self.path.clone(),
            self.os.clone(),
            self.arch.clone(),
            self.version.clone(),
            self.date_created.timestamp().to_string(),
            self.size.to_string(),
        ]
    }
}

impl Canonical for Image {
    fn canonical_values(&self) -> Vec<String> {
        let mut values = self.own_values().to_vec();
        values.extend(self.fs_layers.canonical_values());
        values.extend(self.runtime_params.canonical_values());
        values
    }

    fn hash_into(&self, hasher: &mut CanonicalHasher) {
        hasher.write_values(self.own_values());
        self.fs_layers.hash_into(hasher);
        self.runtime_params.hash_into(hasher);
    }

    fn checksum(&self) -> ImageChecksum {
        self.manifest_checksum()
    }
}

/// Accepts either an RFC 3339 string or integer Unix seconds.
mod date_created {
    use chrono::{DateTime, Utc};
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Seconds(i64),
        Text(DateTime<Utc>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(date) => Ok(date),
            Repr::Seconds(secs) => DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {secs}"))),
        }
    }
}

/// Embeds the raw metadata bytes in the manifest as a verbatim JSON value.
mod raw_json {
    use serde::de::Deserializer;
    use serde::ser::{Error, Serializer};
    use serde::{Deserialize, Serialize};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(raw: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if raw.is_empty() {
            return serializer.serialize_none();
        }
        let text = std::str::from_utf8(raw).map_err(S::Error::custom)?;
        let value: &RawValue = serde_json::from_str(text).map_err(S::Error::custom)?;
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let value = Option::<Box<RawValue>>::deserialize(deserializer)?;
        Ok(value
            .map(|v| v.get().as_bytes().to_vec())
            .unwrap_or_default())
    }
}
