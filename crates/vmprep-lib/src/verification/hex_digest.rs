use std::fmt;

/// Lowercase hexadecimal content digest.
///
/// The empty digest is a sentinel for "no local content", and never equals a
/// digest computed over real bytes (even zero bytes).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HexDigest(String);

impl HexDigest {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(bytes))
    }

    /// Normalizes a checksum endpoint body: surrounding whitespace is dropped
    /// and hex letters are lowercased.
    pub fn from_checksum_text(text: &str) -> Self {
        Self(text.trim().to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True only when both digests are real and equal.
    pub fn matches(&self, other: &HexDigest) -> bool {
        !self.is_empty() && self == other
    }
}

impl fmt::Display for HexDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}
