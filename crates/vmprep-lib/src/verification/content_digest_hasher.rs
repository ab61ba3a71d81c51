use super::HexDigest;
use digest::Digest;
use md5::Md5;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("expected {expected}, got {actual}")]
    Mismatch {
        expected: HexDigest,
        actual: HexDigest,
    },
}

#[derive(Clone, Default)]
pub struct ContentDigestHasher {
    hasher: Md5,
}

impl ContentDigestHasher {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        Digest::update(&mut self.hasher, data.as_ref());
    }

    pub fn finalize(self) -> HexDigest {
        HexDigest::from_bytes(self.hasher.finalize())
    }
}

/// Hashes content as it streams past and checks it against the digest the
/// server published.
pub struct ContentDigestVerifier {
    hasher: ContentDigestHasher,
    expected: HexDigest,
}

impl ContentDigestVerifier {
    #[inline]
    pub fn new(expected: HexDigest) -> Self {
        Self {
            hasher: ContentDigestHasher::new(),
            expected,
        }
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        self.hasher.update(data);
    }

    /// Returns the actual digest when it matches. An empty expectation never
    /// matches.
    pub fn verify(self) -> Result<HexDigest, VerificationError> {
        let actual = self.hasher.finalize();
        if self.expected.matches(&actual) {
            Ok(actual)
        } else {
            Err(VerificationError::Mismatch {
                expected: self.expected,
                actual,
            })
        }
    }
}
