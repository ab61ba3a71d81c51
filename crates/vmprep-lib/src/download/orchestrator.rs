use super::fetcher::{ChunkFetcher, FetchError};
use super::types::{ChunkFile, DownloadOptions, FetchOutcome};
use crate::error::VmPrepError;
use crate::process;
use futures::future::join_all;
use itertools::Itertools;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Downloads a chunk set, runs its first chunk to assemble the artifact and
/// removes the chunks afterwards.
#[derive(Clone, Debug)]
pub struct ChunkSetDownloader {
    fetcher: ChunkFetcher,
    options: DownloadOptions,
}

impl ChunkSetDownloader {
    pub fn new(client: reqwest::Client, options: DownloadOptions) -> Self {
        Self {
            fetcher: ChunkFetcher::new(client),
            options,
        }
    }

    /// One path per chunk. Two chunks sharing a file name would be written to
    /// the same file concurrently, so that is rejected before anything is
    /// fetched.
    fn local_paths(&self, chunks: &[ChunkFile]) -> Result<Vec<PathBuf>, VmPrepError> {
        let names = chunks
            .iter()
            .map(ChunkFile::local_file_name)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(name) = names.iter().duplicates().next() {
            return Err(VmPrepError::DuplicateChunkFile { name: name.clone() });
        }

        Ok(names
            .iter()
            .map(|name| self.options.work_dir.join(name))
            .collect())
    }

    pub async fn download_and_build(&self, chunks: &[ChunkFile]) -> Result<(), VmPrepError> {
        if chunks.is_empty() {
            return Err(VmPrepError::EmptyChunkSet);
        }
        let paths = self.local_paths(chunks)?;

        let outcomes = self.fetch_chunks(chunks, &paths).await?;
        let fetched = outcomes
            .iter()
            .filter(|outcome| **outcome == FetchOutcome::Fetched)
            .count();
        tracing::info!(
            fetched,
            up_to_date = outcomes.len() - fetched,
            "All chunks verified"
        );

        self.assemble(&paths[0]).await?;

        if self.options.keep_chunks {
            tracing::info!("Keeping chunk files");
            return Ok(());
        }
        remove_chunks(&paths).await
    }

    /// Fetches every chunk concurrently and waits for all of them, without
    /// running the assembly step.
    ///
    /// For callers that only want the chunks on disk, or want to observe the
    /// fetch barrier in isolation, e.g. to check which chunks a rerun would
    /// download.
    pub async fn fetch_all(&self, chunks: &[ChunkFile]) -> Result<Vec<FetchOutcome>, VmPrepError> {
        let paths = self.local_paths(chunks)?;
        self.fetch_chunks(chunks, &paths).await
    }

    async fn fetch_chunks(
        &self,
        chunks: &[ChunkFile],
        paths: &[PathBuf],
    ) -> Result<Vec<FetchOutcome>, VmPrepError> {
        tracing::info!("Fetching {} chunks...", chunks.len());

        let results = join_all(
            chunks
                .iter()
                .zip(paths)
                .map(|(chunk, path)| self.fetcher.ensure_fresh(chunk, path)),
        )
        .await;

        reduce_fetch_results(results)
    }

    async fn assemble(&self, entry_point: &Path) -> Result<(), VmPrepError> {
        make_executable(entry_point)
            .await
            .map_err(|source| VmPrepError::MakeExecutable {
                path: entry_point.to_path_buf(),
                source,
            })?;

        let program = std::path::absolute(entry_point)?;
        tracing::info!(program = %program.display(), "Running assembly step");

        let mut command = Command::new(&program);
        command.current_dir(&self.options.work_dir);
        let status = process::run(&mut command).await?;

        if !status.success() {
            return Err(VmPrepError::Assembly { program, status });
        }
        Ok(())
    }
}

/// Go/no-go decision after the barrier join.
///
/// Every failure is logged. Any failure aborts the run; the error carries the
/// first failure in chunk order.
pub fn reduce_fetch_results(
    results: Vec<Result<FetchOutcome, FetchError>>,
) -> Result<Vec<FetchOutcome>, VmPrepError> {
    let total = results.len();
    let (outcomes, failures): (Vec<_>, Vec<_>) = results.into_iter().partition_result();

    for failure in &failures {
        tracing::warn!("Chunk download failed: {}", failure);
    }

    let failed = failures.len();
    match failures.into_iter().next() {
        None => Ok(outcomes),
        Some(first) => Err(VmPrepError::ChunkFetch {
            failed,
            total,
            first: Box::new(first),
        }),
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = tokio::fs::metadata(path).await?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    tokio::fs::set_permissions(path, permissions).await
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Stops at the first file that cannot be removed.
async fn remove_chunks(paths: &[PathBuf]) -> Result<(), VmPrepError> {
    for path in paths {
        tokio::fs::remove_file(path)
            .await
            .map_err(|source| VmPrepError::Cleanup {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "Removed chunk file");
    }
    Ok(())
}
