use crate::catalog::CatalogError;
use crate::download::{FetchError, InvalidChunkUrl};
use crate::manifest::ManifestError;
use crate::process::{ExitStatus, ProcessError};
use crate::virtualbox::VirtualBoxError;
use crate::vm_name::VmNameError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VmPrepError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{failed} of {total} chunk downloads failed, first failure: {first}")]
    ChunkFetch {
        failed: usize,
        total: usize,
        #[source]
        first: Box<FetchError>,
    },

    #[error(transparent)]
    InvalidChunkUrl(#[from] InvalidChunkUrl),

    #[error("No chunk files to download")]
    EmptyChunkSet,

    #[error("More than one chunk would be saved as {name}")]
    DuplicateChunkFile { name: String },

    #[error("Failed to make {} executable: {source}", .path.display())]
    MakeExecutable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Assembly step {} failed with {status}", .program.display())]
    Assembly { program: PathBuf, status: ExitStatus },

    #[error("Assembly finished but {} was not produced", .path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Failed to remove chunk file {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Invalid VM name: {0}")]
    VmName(#[from] VmNameError),

    #[error("VirtualBox error: {0}")]
    VirtualBox(#[from] VirtualBoxError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
