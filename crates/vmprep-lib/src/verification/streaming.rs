use super::{ContentDigestHasher, ContentDigestVerifier, HexDigest, VerificationError};
use futures::{Stream, StreamExt};
use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};

const BUF_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum CopyError {
    #[error("failed to read source stream: {0}")]
    Source(#[source] Box<dyn StdError + Send + Sync>),

    #[error("failed to write {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// Copies `stream` into a freshly created (or truncated) file at `path`,
/// feeding every chunk to `verifier` on the way through. Returns the content
/// digest when it matches the expected one.
///
/// The file is flushed and closed before the digest is checked, so a
/// mismatching body stays on disk. On a stream or write error the handle is
/// dropped with whatever was written so far.
pub async fn copy_stream_verified<S, B, E>(
    stream: S,
    path: &Path,
    mut verifier: ContentDigestVerifier,
) -> Result<HexDigest, CopyError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    let sink_error = |source: io::Error| CopyError::Sink {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::create(path).await.map_err(sink_error)?;
    let mut writer = BufWriter::new(file);

    let mut stream = std::pin::pin!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| CopyError::Source(e.into()))?;
        verifier.update(chunk.as_ref());
        writer.write_all(chunk.as_ref()).await.map_err(sink_error)?;
    }

    writer.flush().await.map_err(sink_error)?;
    // Close synchronously: the file may be executed immediately afterwards.
    drop(writer.into_inner().into_std().await);

    Ok(verifier.verify()?)
}

/// Hashes everything `reader` yields without keeping it.
pub async fn digest_reader<R>(mut reader: R) -> io::Result<HexDigest>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = ContentDigestHasher::new();
    let mut buffer = vec![0u8; BUF_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    const HELLO_MD5: &str = "b1946ac92492d2347c6235b4d2611184";

    fn expecting(digest: &str) -> ContentDigestVerifier {
        ContentDigestVerifier::new(HexDigest::from_checksum_text(digest))
    }

    #[tokio::test]
    async fn test_copy_writes_file_and_returns_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk.bin");
        let body = stream::iter(vec![
            Ok::<_, io::Error>(b"hel".to_vec()),
            Ok(b"lo\n".to_vec()),
        ]);

        let digest = copy_stream_verified(body, &path, expecting(HELLO_MD5))
            .await
            .unwrap();

        assert_eq!(digest.as_str(), HELLO_MD5);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello\n");
    }

    #[tokio::test]
    async fn test_copy_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk.bin");
        std::fs::write(&path, b"previous and much longer content").unwrap();

        let body = stream::iter(vec![Ok::<_, io::Error>(b"abc".to_vec())]);
        let digest = copy_stream_verified(body, &path, expecting("900150983cd24fb0d6963f7d28e17f72"))
            .await
            .unwrap();

        assert_eq!(digest.as_str(), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_copy_reports_source_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk.bin");
        let body = stream::iter(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);

        let err = copy_stream_verified(body, &path, expecting(HELLO_MD5))
            .await
            .unwrap_err();

        assert!(matches!(err, CopyError::Source(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_copy_reports_sink_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("chunk.bin");
        let body = stream::iter(vec![Ok::<_, io::Error>(b"abc".to_vec())]);

        let err = copy_stream_verified(body, &path, expecting(HELLO_MD5))
            .await
            .unwrap_err();

        match err {
            CopyError::Sink { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mismatching_body_is_kept_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk.bin");
        let body = stream::iter(vec![Ok::<_, io::Error>(b"tampered\n".to_vec())]);

        let err = copy_stream_verified(body, &path, expecting(HELLO_MD5))
            .await
            .unwrap_err();

        match err {
            CopyError::Verification(VerificationError::Mismatch { expected, .. }) => {
                assert_eq!(expected.as_str(), HELLO_MD5)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(std::fs::read(&path).unwrap(), b"tampered\n");
    }

    #[tokio::test]
    async fn test_digest_reader_spans_multiple_buffers() {
        let data = vec![b'x'; BUF_SIZE * 2 + 17];
        let mut expected = ContentDigestHasher::new();
        expected.update(&data);

        let digest = digest_reader(data.as_slice()).await.unwrap();

        assert_eq!(digest, expected.finalize());
    }
}
