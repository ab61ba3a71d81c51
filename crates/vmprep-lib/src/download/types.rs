use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use percent_encoding::percent_decode_str;
use url::Url;

/// One checksummed piece of a multi-part artifact, as listed in the manifest.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChunkFile {
    /// URL whose body is the expected MD5 of the chunk
    #[serde(rename = "md5")]
    pub checksum_url: String,
    /// URL of the chunk body
    #[serde(rename = "url")]
    pub content_url: String,
}

#[derive(Error, Debug)]
#[error("cannot derive a local file name from {url}: {reason}")]
pub struct InvalidChunkUrl {
    pub url: String,
    pub reason: String,
}

impl ChunkFile {
    pub fn new(checksum_url: impl Into<String>, content_url: impl Into<String>) -> Self {
        Self {
            checksum_url: checksum_url.into(),
            content_url: content_url.into(),
        }
    }

    /// Percent-decoded last path segment of the content URL; query and
    /// fragment are ignored. A decoded name that could escape the work
    /// directory is rejected.
    pub fn local_file_name(&self) -> Result<String, InvalidChunkUrl> {
        let invalid = |reason: &str| InvalidChunkUrl {
            url: self.content_url.clone(),
            reason: reason.to_string(),
        };

        let url = Url::parse(&self.content_url).map_err(|e| invalid(&e.to_string()))?;
        let name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .ok_or_else(|| invalid("URL has no path"))?;

        if name.is_empty() {
            return Err(invalid("URL path ends with a separator"));
        }

        let name = percent_decode_str(name)
            .decode_utf8()
            .map_err(|e| invalid(&e.to_string()))?;
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(invalid("decoded file name is not a plain file name"));
        }
        Ok(name.into_owned())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The local file already matched the remote digest; the body was not requested.
    UpToDate,
    /// The body was downloaded and its digest verified.
    Fetched,
}

#[derive(Clone, Debug)]
pub struct DownloadOptions {
    /// Directory the chunk files are written to and the assembly step runs in
    pub work_dir: PathBuf,
    /// Leave the chunk files on disk after a successful assembly
    pub keep_chunks: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            keep_chunks: false,
        }
    }
}
