use crate::catalog::fetch_manifest_json;
use crate::cli::params::{ListCatalogParams, ListRegisteredParams};
use crate::config::Config;
use crate::download::build_http_client;
use crate::error::VmPrepError;
use crate::manifest::Manifest;
use crate::virtualbox::VBoxManage;
use crate::vm_name::catalog_vm_names;
use std::io::{self, Write};

pub async fn run_list_catalog(params: ListCatalogParams) -> Result<(), VmPrepError> {
    let names = catalog_names(&params.config).await?;
    write_names(&mut io::stdout().lock(), &names)?;
    Ok(())
}

pub async fn run_list_registered(params: ListRegisteredParams) -> Result<(), VmPrepError> {
    let names = VBoxManage::new(params.vboxmanage)
        .registered_vm_names()
        .await?;
    write_names(&mut io::stdout().lock(), &names)?;
    Ok(())
}

/// Sorted VM names the configured catalog offers.
pub async fn catalog_names(config: &Config) -> Result<Vec<String>, VmPrepError> {
    let client = build_http_client()?;
    let manifest_json = fetch_manifest_json(&client, &config.catalog_url).await?;
    let manifest = Manifest::parse(&manifest_json)?;
    Ok(catalog_vm_names(&manifest, &config.os_name, &config.software_name)?)
}

fn write_names<W: Write>(out: &mut W, names: &[String]) -> io::Result<()> {
    for name in names {
        writeln!(out, "{name}")?;
    }
    out.flush()
}
