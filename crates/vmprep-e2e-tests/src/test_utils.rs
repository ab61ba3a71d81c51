use eyre::Result;
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use vmprep_lib::Config;
use vmprep_lib::config::load_config;
use vmprep_lib::download::{ChunkFile, DownloadOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Held by every test that executes a file it wrote. Linux refuses to exec a
/// file while another thread's forked child still holds a write handle to it.
pub static EXEC_LOCK: Mutex<()> = Mutex::const_new(());

pub const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("vmprep_lib=debug,vmprep_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn md5_hex(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Serves `/<name>.md5` with the digest of `body` and `/<name>` with `body`,
/// expecting exactly `content_requests` requests for the body.
pub async fn mount_chunk(
    server: &MockServer,
    name: &str,
    body: &[u8],
    content_requests: u64,
) -> ChunkFile {
    mount_checksum(server, name, &md5_hex(body)).await;
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(content_requests)
        .mount(server)
        .await;
    chunk_at(server, name)
}

pub async fn mount_checksum(server: &MockServer, name: &str, checksum: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}.md5")))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{checksum}\n")))
        .mount(server)
        .await;
}

pub fn chunk_at(server: &MockServer, name: &str) -> ChunkFile {
    ChunkFile::new(
        format!("{}/{name}.md5", server.uri()),
        format!("{}/{name}", server.uri()),
    )
}

pub fn download_options(work_dir: &Path, keep_chunks: bool) -> DownloadOptions {
    DownloadOptions {
        work_dir: work_dir.to_path_buf(),
        keep_chunks,
    }
}

/// Defaults with the catalog, work directory and `VBoxManage` pointed at the
/// test fixtures.
pub fn test_config(catalog_url: String, work_dir: &Path, vboxmanage: &Path) -> Result<Config> {
    let mut config = load_config(None)?;
    config.catalog_url = catalog_url;
    config.work_dir = work_dir.to_path_buf();
    config.vboxmanage = vboxmanage.to_path_buf();
    Ok(config)
}

/// Writes an executable shell script.
pub fn write_script(path: &Path, body: &str) -> Result<()> {
    std::fs::write(path, format!("#!/bin/sh\n{body}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// A stand-in for `VBoxManage` that appends each invocation's arguments to
/// `<dir>/vboxmanage.log`. `showvminfo` exits with `showvminfo_exit`, `list`
/// prints `list_output`, everything else succeeds.
pub struct FakeVBoxManage {
    pub program: PathBuf,
    pub log: PathBuf,
}

impl FakeVBoxManage {
    pub fn install(dir: &Path, showvminfo_exit: i32, list_output: &str) -> Result<Self> {
        let program = dir.join("VBoxManage");
        let log = dir.join("vboxmanage.log");
        write_script(
            &program,
            &format!(
                r#"echo "$@" >> '{log}'
case "$1" in
  showvminfo) exit {showvminfo_exit} ;;
  list) printf '%s' '{list_output}' ;;
esac
exit 0
"#,
                log = log.display(),
            ),
        )?;
        Ok(Self { program, log })
    }

    pub fn invocations(&self) -> Result<Vec<String>> {
        if !self.log.exists() {
            return Ok(Vec::new());
        }
        Ok(std::fs::read_to_string(&self.log)?
            .lines()
            .map(str::to_string)
            .collect())
    }
}
