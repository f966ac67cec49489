//! Identifier newtypes for image names and checksums.
//!
//! Each wraps a `String` and serializes as a bare JSON string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! id_string {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
    };
}

id_string!(
    /// Lowercase 64-character hex SHA-256 digest over an image's canonical form.
    ImageChecksum
);

id_string!(
    /// Truncated 12-character prefix of an [`ImageChecksum`], used for display.
    ShortId
);

id_string!(
    /// Human-readable `domain/path/os-arch-version` name of an image.
    NormalForm
);

impl ImageChecksum {
    /// Length of a short id prefix.
    pub const SHORT_LEN: usize = 12;

    /// Hex-encode a finished digest.
    pub fn from_digest(digest: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(digest))
    }

    pub fn short_id(&self) -> ShortId {
        ShortId(self.0.chars().take(Self::SHORT_LEN).collect())
    }

    /// Compare against a stored checksum, ignoring ASCII case and surrounding
    /// whitespace of `expected`.
    pub fn matches(&self, expected: &str) -> bool {
        self.0.eq_ignore_ascii_case(expected.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_display_and_deref() {
        let sum = ImageChecksum::new("abc123");
        assert_eq!(sum.to_string(), "abc123");
        assert_eq!(sum.as_str(), "abc123");
        assert_eq!(sum.len(), 6);
        assert!(sum == *"abc123");
    }

    #[test]
    fn checksum_serializes_as_bare_string() {
        let sum = ImageChecksum::new("deadbeef");
        let json = serde_json::to_string(&sum).unwrap();
        assert_eq!(json, "\"deadbeef\"");
        let back: ImageChecksum = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sum);
    }

    #[test]
    fn from_digest_is_lowercase_hex() {
        let sum = ImageChecksum::from_digest([0xAB, 0x01, 0xFF]);
        assert_eq!(sum.as_str(), "ab01ff");
    }

    #[test]
    fn short_id_is_prefix() {
        let sum = ImageChecksum::new("0123456789abcdef0123");
        assert_eq!(sum.short_id().as_str(), "0123456789ab");
    }

    #[test]
    fn short_id_of_short_checksum() {
        let sum = ImageChecksum::new("abc");
        assert_eq!(sum.short_id().as_str(), "abc");
    }

    #[test]
    fn matches_ignores_case_and_padding() {
        let sum = ImageChecksum::new("abc123");
        assert!(sum.matches("abc123"));
        assert!(sum.matches("  ABC123\n"));
        assert!(!sum.matches("abc12"));
        assert!(!sum.matches(""));
    }

    #[test]
    fn normal_form_into_inner() {
        let name = NormalForm::new("example.com/foo/linux-amd64-1");
        assert_eq!(name.into_inner(), "example.com/foo/linux-amd64-1");
    }
}
