use crate::image::Image;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode manifest: {0}")]
    Encoding(#[source] serde_json::Error),
    #[error("failed to decode manifest: {0}")]
    Decoding(#[source] serde_json::Error),
    #[error("checksum mismatch: expected '{expected}', computed '{computed}'")]
    ChecksumMismatch { expected: String, computed: String },
}

impl ManifestError {
    pub fn is_decoding(&self) -> bool {
        matches!(self, Self::Decoding(_))
    }
}

impl Image {
    /// Marshal the manifest, re-encoding extended metadata from the map first.
    pub fn encode_manifest(&mut self) -> Result<Vec<u8>, ManifestError> {
        self.encode_extended_metadata()?;
        let data = serde_json::to_vec(self).map_err(ManifestError::Encoding)?;
        debug!("encoded manifest {}: {} bytes", self.normal_form(), data.len());
        Ok(data)
    }

    /// Unmarshal a manifest and decode its extended metadata into the map.
    pub fn decode_manifest(data: &[u8]) -> Result<Self, ManifestError> {
        let mut image: Image = serde_json::from_slice(data).map_err(ManifestError::Decoding)?;
        image.decode_extended_metadata()?;
        debug!(
            "decoded manifest {}: {} metadata keys",
            image.normal_form(),
            image.extended_metadata.len()
        );
        Ok(image)
    }

    /// Replace the raw metadata bytes with the serialized metadata map.
    ///
    /// Object keys are written in sorted order at every depth, so equal maps
    /// give equal bytes whatever their insertion order.
    pub fn encode_extended_metadata(&mut self) -> Result<(), ManifestError> {
        let sorted = sorted_object(&self.extended_metadata);
        self.extended_metadata_raw = serde_json::to_vec(&sorted).map_err(ManifestError::Encoding)?;
        Ok(())
    }

    /// Replace the metadata map with the parsed raw metadata bytes.
    ///
    /// Empty bytes and `null` decode to an empty map. Anything other than a
    /// JSON object is rejected.
    pub fn decode_extended_metadata(&mut self) -> Result<(), ManifestError> {
        if self.extended_metadata_raw.iter().all(u8::is_ascii_whitespace) {
            self.extended_metadata.clear();
            self.extended_metadata_raw.clear();
            return Ok(());
        }
        let parsed: Option<Map<String, Value>> =
            serde_json::from_slice(&self.extended_metadata_raw).map_err(ManifestError::Decoding)?;
        self.extended_metadata = parsed.unwrap_or_default();
        Ok(())
    }
}

// `Map` keeps insertion order when serde_json's `preserve_order` feature is
// enabled anywhere in the build, so key order is fixed here instead.
fn sorted_object(map: &Map<String, Value>) -> BTreeMap<&str, SortedValue<'_>> {
    map.iter()
        .map(|(key, value)| (key.as_str(), SortedValue(value)))
        .collect()
}

struct SortedValue<'a>(&'a Value);

impl Serialize for SortedValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => sorted_object(map).serialize(serializer),
            Value::Array(items) => serializer.collect_seq(items.iter().map(SortedValue)),
            other => other.serialize(serializer),
        }
    }
}

pub fn parse_manifest_slice(data: &[u8]) -> Result<Image, ManifestError> {
    Image::decode_manifest(data)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Image, ManifestError> {
    let data = fs::read(path)?;
    parse_manifest_slice(&data)
}

/// Deserialize `null` as the default value, for collections written as `null`
/// by producers that do not distinguish empty from absent.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{FsLayers, ImageBase};
    use crate::runtime::{PortSpec, RuntimeParams};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample() -> Image {
        let mut image = Image {
            domain: "example.com".to_owned(),
            path: "foo/bar".to_owned(),
            os: "linux".to_owned(),
            arch: "arm64".to_owned(),
            version: "1.2.0".to_owned(),
            date_created: Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap(),
            size: 123_456,
            fs_layers: FsLayers {
                base: Some(ImageBase {
                    domain: "example.com".to_owned(),
                    path: "base".to_owned(),
                    version: "1".to_owned(),
                    checksum: "abc".to_owned(),
                }),
                checksums: vec!["l1".to_owned(), "l2".to_owned()],
            },
            runtime_params: RuntimeParams {
                user: "app".to_owned(),
                ports: vec![PortSpec::new("tcp", "8080")],
                entrypoint: vec!["/app".to_owned()],
                environment: BTreeMap::from([("MODE".to_owned(), "prod".to_owned())]),
                ..RuntimeParams::default()
            },
            ..Image::default()
        };
        image
            .extended_metadata
            .insert("team".to_owned(), json!("infra"));
        image
            .extended_metadata
            .insert("labels".to_owned(), json!({"tier": "backend", "replicas": 3}));
        image
    }

    #[test]
    fn roundtrip_preserves_digest_fields_and_metadata() {
        let mut original = sample();
        let data = original.encode_manifest().unwrap();
        let decoded = Image::decode_manifest(&data).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.extended_metadata, sample().extended_metadata);
        assert_eq!(decoded.manifest_checksum(), original.manifest_checksum());
        assert_eq!(decoded.extended_checksum(), original.extended_checksum());
    }

    #[test]
    fn encode_writes_camel_case_fields() {
        let data = sample().encode_manifest().unwrap();
        let value: Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["dateCreated"], "2023-11-14T22:13:20Z");
        assert_eq!(value["fsLayers"]["base"]["checksum"], "abc");
        assert_eq!(value["fsLayers"]["checksums"], json!(["l1", "l2"]));
        assert_eq!(
            value["runtimeParams"]["ports"],
            json!([{"protocol": "tcp", "port": "8080"}])
        );
        assert_eq!(value["runtimeParams"]["cpuShares"], 0);
        assert_eq!(value["extendedMetadata"]["labels"]["replicas"], 3);
    }

    #[test]
    fn encode_refreshes_stale_raw_bytes() {
        let mut image = sample();
        image.extended_metadata_raw = b"{\"stale\":true}".to_vec();
        image.encode_manifest().unwrap();
        let raw: Value = serde_json::from_slice(&image.extended_metadata_raw).unwrap();
        assert_eq!(raw["team"], "infra");
        assert!(raw.get("stale").is_none());
    }

    #[test]
    fn metadata_encoding_is_key_order_independent() {
        let mut a = Image::default();
        a.extended_metadata.insert("b".to_owned(), json!(2));
        a.extended_metadata.insert("a".to_owned(), json!(1));
        let mut b = Image::default();
        b.extended_metadata.insert("a".to_owned(), json!(1));
        b.extended_metadata.insert("b".to_owned(), json!(2));

        a.encode_extended_metadata().unwrap();
        b.encode_extended_metadata().unwrap();
        assert_eq!(a.extended_metadata_raw, br#"{"a":1,"b":2}"#);
        assert_eq!(a.extended_checksum(), b.extended_checksum());
    }

    #[test]
    fn nested_metadata_encoding_is_key_order_independent() {
        let mut a = Image::default();
        a.extended_metadata.insert("b".to_owned(), json!({"y": 1, "x": 2}));
        a.extended_metadata.insert("a".to_owned(), json!(1));
        let mut b = Image::default();
        b.extended_metadata.insert("a".to_owned(), json!(1));
        b.extended_metadata.insert("b".to_owned(), json!({"x": 2, "y": 1}));

        a.encode_extended_metadata().unwrap();
        b.encode_extended_metadata().unwrap();
        assert_eq!(a.extended_metadata_raw, br#"{"a":1,"b":{"x":2,"y":1}}"#);
        assert_eq!(a.extended_metadata_raw, b.extended_metadata_raw);
        assert_eq!(a.extended_checksum(), b.extended_checksum());
    }

    #[test]
    fn metadata_keys_inside_arrays_are_sorted() {
        let mut image = Image::default();
        image.extended_metadata.insert(
            "layers".to_owned(),
            json!([{"z": null, "m": [{"k": 1, "c": 2}]}, "plain", 1.5]),
        );
        image.encode_extended_metadata().unwrap();
        assert_eq!(
            image.extended_metadata_raw,
            br#"{"layers":[{"m":[{"c":2,"k":1}],"z":null},"plain",1.5]}"#
        );

        image.decode_extended_metadata().unwrap();
        assert_eq!(image.extended_metadata["layers"][0]["m"][0]["k"], 1);
    }

    #[test]
    fn empty_map_encodes_as_empty_object() {
        let mut image = Image::default();
        image.encode_extended_metadata().unwrap();
        assert_eq!(image.extended_metadata_raw, b"{}");
    }

    #[test]
    fn whitespace_raw_metadata_decodes_to_nothing() {
        let mut image = sample();
        image.extended_metadata_raw = b" \n\t ".to_vec();
        image.decode_extended_metadata().unwrap();
        assert!(image.extended_metadata.is_empty());
        assert!(image.extended_metadata_raw.is_empty());
        assert_eq!(image.extended_checksum(), image.manifest_checksum());
    }

    #[test]
    fn encode_manifest_replaces_corrupt_raw_bytes() {
        let mut image = sample();
        image.extended_metadata_raw = b"{\"team\":".to_vec();
        let data = image.encode_manifest().unwrap();
        let decoded = Image::decode_manifest(&data).unwrap();
        assert_eq!(decoded.extended_metadata, sample().extended_metadata);
        assert_eq!(decoded.extended_checksum(), image.extended_checksum());
    }

    #[test]
    fn extended_checksum_follows_metadata_after_reencode() {
        let mut image = sample();
        image.encode_extended_metadata().unwrap();
        let before = image.extended_checksum();

        image
            .extended_metadata
            .insert("team".to_owned(), json!("platform"));
        assert_eq!(image.extended_checksum(), before);

        image.encode_extended_metadata().unwrap();
        assert_ne!(image.extended_checksum(), before);
        assert_ne!(image.extended_checksum(), image.manifest_checksum());
    }

    #[test]
    fn decode_fills_metadata_map() {
        let data = br#"{
            "domain": "example.com",
            "path": "foo",
            "os": "linux",
            "arch": "amd64",
            "version": "1",
            "dateCreated": "2020-01-01T00:00:00Z",
            "size": 10,
            "fsLayers": {"base": null, "checksums": []},
            "runtimeParams": {"ports": null, "environment": null},
            "extendedMetadata": {"owner": "ops", "n": 1}
        }"#;
        let image = Image::decode_manifest(data).unwrap();
        assert_eq!(image.extended_metadata["owner"], "ops");
        assert_eq!(image.extended_metadata["n"], 1);
        assert_eq!(image.extended_metadata_raw, br#"{"owner": "ops", "n": 1}"#);
        assert_eq!(image.date_created.timestamp(), 1_577_836_800);
    }

    #[test]
    fn missing_or_null_metadata_decodes_to_empty_map() {
        for data in [
            br#"{"domain":"x"}"#.as_slice(),
            br#"{"domain":"x","extendedMetadata":null}"#.as_slice(),
        ] {
            let image = Image::decode_manifest(data).unwrap();
            assert!(image.extended_metadata.is_empty());
            assert!(image.extended_metadata_raw.is_empty());
            assert_eq!(image.manifest_checksum(), image.extended_checksum());
        }
    }

    #[test]
    fn malformed_manifest_is_decoding_error() {
        let err = Image::decode_manifest(b"{not json").unwrap_err();
        assert!(err.is_decoding());
        assert!(err.to_string().starts_with("failed to decode manifest"));
    }

    #[test]
    fn schema_mismatch_is_decoding_error() {
        let err = Image::decode_manifest(br#"{"size": "big"}"#).unwrap_err();
        assert!(err.is_decoding());
    }

    #[test]
    fn non_object_metadata_is_decoding_error() {
        let err = Image::decode_manifest(br#"{"extendedMetadata": [1, 2]}"#).unwrap_err();
        assert!(err.is_decoding());
    }

    #[test]
    fn corrupt_raw_bytes_fail_decode_and_keep_map() {
        let mut image = sample();
        image.extended_metadata_raw = b"{\"team\":".to_vec();
        let err = image.decode_extended_metadata().unwrap_err();
        assert!(err.is_decoding());
        assert_eq!(image.extended_metadata["team"], "infra");
    }

    #[test]
    fn corrupt_raw_bytes_fail_serialization() {
        let mut image = sample();
        image.extended_metadata_raw = b"not json".to_vec();
        assert!(serde_json::to_vec(&image).is_err());
    }

    #[test]
    fn parse_manifest_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let data = sample().encode_manifest().unwrap();
        std::fs::write(&path, &data).unwrap();

        let image = parse_manifest_file(&path).unwrap();
        assert_eq!(
            image.normal_form().as_str(),
            "example.com/foo/bar/linux-arm64-1.2.0"
        );
        assert_eq!(image.extended_metadata["team"], "infra");
    }

    #[test]
    fn parse_manifest_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_manifest_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io(_)));
    }
}
