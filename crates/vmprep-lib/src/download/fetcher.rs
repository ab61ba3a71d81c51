use super::types::{ChunkFile, FetchOutcome};
use crate::verification::{
    ContentDigestVerifier, CopyError, HexDigest, VerificationError, copy_stream_verified,
    local_digest,
};
use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch checksum from {url}: {source}")]
    Checksum {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch content from {url}: {source}")]
    Content {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Failed to read local file {}: {source}", .path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write local file {}: {source}", .path.display())]
    LocalWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Digest mismatch for {}: {source}", .path.display())]
    DigestMismatch {
        path: PathBuf,
        #[source]
        source: VerificationError,
    },
}

/// HTTP client shared by the catalog and every chunk fetch. No request
/// timeout is set: a chunk download runs until the server finishes or fails.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(concat!("vmprep/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Fetch-or-skip for a single chunk. Nothing here retries.
#[derive(Clone, Debug)]
pub struct ChunkFetcher {
    client: reqwest::Client,
}

impl ChunkFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Makes sure `local_path` holds the chunk's content.
    ///
    /// The expected digest is always fetched first. The body is only requested
    /// when the local file is missing or its digest differs. A body whose
    /// digest does not match is left on disk and reported as
    /// [`FetchError::DigestMismatch`].
    pub async fn ensure_fresh(
        &self,
        chunk: &ChunkFile,
        local_path: &Path,
    ) -> Result<FetchOutcome, FetchError> {
        let expected = self.fetch_expected_digest(&chunk.checksum_url).await?;

        let local = local_digest(local_path)
            .await
            .map_err(|source| FetchError::LocalRead {
                path: local_path.to_path_buf(),
                source,
            })?;

        if local.matches(&expected) {
            tracing::debug!(url = %chunk.content_url, path = %local_path.display(), digest = %expected, "Local file matches remote digest, skipping download");
            return Ok(FetchOutcome::UpToDate);
        }

        tracing::info!(url = %chunk.content_url, path = %local_path.display(), expected_digest = %expected, local_digest = %local, "Downloading");
        let verifier = ContentDigestVerifier::new(expected);
        let actual = self
            .download_verified(&chunk.content_url, local_path, verifier)
            .await?;

        tracing::info!(url = %chunk.content_url, path = %local_path.display(), digest = %actual, "Downloaded and verified");
        Ok(FetchOutcome::Fetched)
    }

    async fn fetch_expected_digest(&self, url: &str) -> Result<HexDigest, FetchError> {
        let checksum_error = |source| FetchError::Checksum {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(checksum_error)?;
        let text = response.text().await.map_err(checksum_error)?;

        tracing::trace!(url, checksum = text.as_str(), "Fetched checksum");
        Ok(HexDigest::from_checksum_text(&text))
    }

    async fn download_verified(
        &self,
        url: &str,
        path: &Path,
        verifier: ContentDigestVerifier,
    ) -> Result<HexDigest, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| FetchError::Content {
                url: url.to_string(),
                source: source.into(),
            })?;

        copy_stream_verified(response.bytes_stream(), path, verifier)
            .await
            .map_err(|err| match err {
                CopyError::Source(source) => FetchError::Content {
                    url: url.to_string(),
                    source,
                },
                CopyError::Sink { path, source } => FetchError::LocalWrite { path, source },
                CopyError::Verification(source) => FetchError::DigestMismatch {
                    path: path.to_path_buf(),
                    source,
                },
            })
    }
}
