//! Value-sequence hashing shared by every canonicalized entity.
//!
//! A canonical form is an ordered list of strings. Each value is written to the
//! SHA-256 accumulator as an 8-byte big-endian length followed by its bytes, so
//! the digest identifies the exact sequence: no value can absorb its neighbour,
//! and an absent group of values never collides with a group of empty strings.

use crate::types::ImageChecksum;
use sha2::{Digest, Sha256};

/// Incremental SHA-256 accumulator over canonical values.
#[derive(Clone, Default)]
pub struct CanonicalHasher {
    inner: Sha256,
}

impl CanonicalHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a single length-framed value.
    pub fn write_value(&mut self, value: &str) {
        self.inner.update((value.len() as u64).to_be_bytes());
        self.inner.update(value.as_bytes());
    }

    pub fn write_values<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.write_value(value.as_ref());
        }
    }

    pub fn finalize(self) -> ImageChecksum {
        ImageChecksum::from_digest(self.inner.finalize())
    }

    /// Append unframed bytes and finish the digest. An empty trailer gives the
    /// same checksum as [`CanonicalHasher::finalize`].
    pub fn finalize_with_trailer(mut self, trailer: &[u8]) -> ImageChecksum {
        self.inner.update(trailer);
        self.finalize()
    }
}

/// An entity with a deterministic, ordered value sequence.
pub trait Canonical {
    /// The ordered values this entity contributes to a digest.
    fn canonical_values(&self) -> Vec<String>;

    fn hash_into(&self, hasher: &mut CanonicalHasher) {
        hasher.write_values(self.canonical_values());
    }

    /// Standalone digest over this entity's values alone.
    fn checksum(&self) -> ImageChecksum {
        let mut hasher = CanonicalHasher::new();
        self.hash_into(&mut hasher);
        hasher.finalize()
    }
}

/// Digest a bare value sequence.
pub fn digest_values<I, S>(values: I) -> ImageChecksum
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = CanonicalHasher::new();
    hasher.write_values(values);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_is_sha256_of_nothing() {
        let empty: [&str; 0] = [];
        assert_eq!(
            digest_values(empty).as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_is_64_lowercase_hex() {
        let sum = digest_values(["a", "b"]);
        assert_eq!(sum.len(), 64);
        assert!(sum
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn framing_separates_adjacent_values() {
        assert_ne!(digest_values(["ab", "c"]), digest_values(["a", "bc"]));
    }

    #[test]
    fn empty_values_are_not_dropped() {
        let none: [&str; 0] = [];
        assert_ne!(digest_values(none), digest_values([""]));
        assert_ne!(digest_values([""]), digest_values(["", ""]));
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut hasher = CanonicalHasher::new();
        hasher.write_value("x");
        hasher.write_values(["y", "z"]);
        assert_eq!(hasher.finalize(), digest_values(["x", "y", "z"]));
    }

    #[test]
    fn empty_trailer_is_a_no_op() {
        let mut a = CanonicalHasher::new();
        a.write_value("x");
        let b = a.clone();
        assert_eq!(a.finalize(), b.finalize_with_trailer(b""));
    }

    #[test]
    fn trailer_is_unframed_suffix() {
        let mut hasher = CanonicalHasher::new();
        hasher.write_value("x");
        let plain = hasher.clone().finalize();
        let with_trailer = hasher.finalize_with_trailer(b"meta");
        assert_ne!(with_trailer, plain);

        let mut expected = Sha256::new();
        expected.update(1u64.to_be_bytes());
        expected.update(b"x");
        expected.update(b"meta");
        assert_eq!(with_trailer, ImageChecksum::from_digest(expected.finalize()));
    }
}
