mod fetcher;
mod orchestrator;
mod types;

pub use fetcher::{ChunkFetcher, FetchError, build_http_client};
pub use orchestrator::{ChunkSetDownloader, reduce_fetch_results};
pub use types::{ChunkFile, DownloadOptions, FetchOutcome, InvalidChunkUrl};
