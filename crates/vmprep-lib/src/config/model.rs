use crate::download::DownloadOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Page that embeds the VM manifest
    pub catalog_url: String,
    /// Host OS the images are packaged for, as named in the manifest
    pub os_name: String,
    /// Virtualization software the images are packaged for
    pub software_name: String,
    /// Where chunk files and the assembled `.ova` live
    pub work_dir: PathBuf,
    /// `VBoxManage` executable
    pub vboxmanage: PathBuf,
    /// Leave chunk files in `work_dir` after the `.ova` has been assembled
    pub keep_chunks: bool,
    /// Clipboard mode set on the VM after it starts, e.g. `bidirectional`
    #[serde(default)]
    pub clipboard_mode: Option<String>,
}

impl Config {
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            work_dir: self.work_dir.clone(),
            keep_chunks: self.keep_chunks,
        }
    }
}
