//! Container image manifests, canonicalization, and content checksums for cid.
//!
//! This crate defines the manifest model (`Image`, `FsLayers`, `RuntimeParams`),
//! the canonical value sequences each entity contributes to a digest
//! (`Canonical`), the SHA-256 manifest and extended checksums, the human-readable
//! normal form name, JSON manifest encoding/decoding with explicit extended
//! metadata synchronization, and identity verification helpers.

pub mod canonical;
pub mod identity;
pub mod image;
pub mod layers;
pub mod manifest;
pub mod runtime;
pub mod types;

pub use canonical::{digest_values, Canonical, CanonicalHasher};
pub use identity::{verify_checksum, ChecksumVariant, ImageIdentity};
pub use image::Image;
pub use layers::{FsLayers, ImageBase};
pub use manifest::{parse_manifest_file, parse_manifest_slice, ManifestError};
pub use runtime::{PortSpec, RuntimeParams};
pub use types::{ImageChecksum, NormalForm, ShortId};
