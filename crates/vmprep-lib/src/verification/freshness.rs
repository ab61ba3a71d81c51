use super::{HexDigest, digest_reader};
use std::io;
use std::path::Path;

/// Digest of the file at `path`, or the empty digest when there is no file.
///
/// Any other failure to open or read the file is returned as an error.
pub async fn local_digest(path: &Path) -> io::Result<HexDigest> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(HexDigest::empty()),
        Err(err) => return Err(err),
    };
    digest_reader(file).await
}
