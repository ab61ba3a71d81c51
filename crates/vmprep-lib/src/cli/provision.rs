use crate::catalog::fetch_manifest_json;
use crate::cli::params::ProvisionParams;
use crate::config::Config;
use crate::download::{ChunkSetDownloader, build_http_client};
use crate::error::VmPrepError;
use crate::manifest::Manifest;
use crate::virtualbox::VBoxManage;
use crate::vm_name::VmName;
use std::path::{Path, PathBuf};

/// Starts the VM, importing it first if VirtualBox does not know it yet. The
/// `.ova` is downloaded and assembled only when it is not already in
/// `work_dir`.
pub async fn run_provision(params: ProvisionParams) -> Result<(), VmPrepError> {
    let ProvisionParams { vm_name, config } = params;
    let vbox = VBoxManage::new(&config.vboxmanage);

    if vbox.vm_exists(&vm_name).await? {
        tracing::info!(vm = %vm_name, "VM already registered");
    } else {
        setup_vm(&vbox, &vm_name, &config).await?;
    }

    vbox.start_vm(&vm_name).await?;

    if let Some(mode) = &config.clipboard_mode {
        vbox.set_clipboard_mode(&vm_name, mode).await?;
    }

    Ok(())
}

async fn setup_vm(vbox: &VBoxManage, vm_name: &VmName, config: &Config) -> Result<(), VmPrepError> {
    let ova_path = config.work_dir.join(vm_name.ova_file_name());

    if tokio::fs::try_exists(&ova_path).await? {
        tracing::info!(ova = %ova_path.display(), "Using existing image");
    } else {
        build_ova(vm_name, config, &ova_path).await?;
    }

    vbox.import_and_configure(vm_name, &ova_path).await?;
    Ok(())
}

async fn build_ova(vm_name: &VmName, config: &Config, ova_path: &Path) -> Result<(), VmPrepError> {
    let spec = vm_name.to_browser_spec(&config.os_name, &config.software_name)?;

    let client = build_http_client()?;
    let manifest_json = fetch_manifest_json(&client, &config.catalog_url).await?;
    let manifest = Manifest::parse(&manifest_json)?;
    let chunks = manifest.files_for_browser(&spec)?;

    tracing::info!(vm = %vm_name, chunks = chunks.len(), "Building image from catalog");
    ChunkSetDownloader::new(client, config.download_options())
        .download_and_build(chunks)
        .await?;

    if !tokio::fs::try_exists(ova_path).await? {
        return Err(VmPrepError::ArtifactMissing {
            path: PathBuf::from(ova_path),
        });
    }
    Ok(())
}
