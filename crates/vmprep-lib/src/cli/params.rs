use crate::config::Config;
use crate::vm_name::VmName;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ProvisionParams {
    pub vm_name: VmName,
    pub config: Config,
}

#[derive(Debug, Clone)]
pub struct ListCatalogParams {
    pub config: Config,
}

#[derive(Debug, Clone)]
pub struct ListRegisteredParams {
    pub vboxmanage: PathBuf,
}
