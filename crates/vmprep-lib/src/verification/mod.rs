mod content_digest_hasher;
mod freshness;
mod hex_digest;
mod streaming;

pub use content_digest_hasher::{ContentDigestHasher, ContentDigestVerifier, VerificationError};
pub use freshness::local_digest;
pub use hex_digest::HexDigest;
pub use streaming::{CopyError, copy_stream_verified, digest_reader};
