use super::Config;
use crate::catalog::DEFAULT_CATALOG_URL;
use crate::error::VmPrepError;
use crate::virtualbox::DEFAULT_VBOXMANAGE;
use config::Config as ConfigBuilder;

pub const ENV_PREFIX: &str = "VMPREP";

/// Defaults, then the optional config file, then `VMPREP_*` environment
/// variables.
pub fn load_config(config_path: Option<&str>) -> Result<Config, VmPrepError> {
    let mut config_builder = ConfigBuilder::builder()
        .set_default("catalog_url", DEFAULT_CATALOG_URL)?
        .set_default("os_name", "Mac")?
        .set_default("software_name", "VirtualBox")?
        .set_default("work_dir", ".")?
        .set_default("vboxmanage", DEFAULT_VBOXMANAGE)?
        .set_default("keep_chunks", false)?;

    if let Some(config_path) = config_path {
        tracing::debug!("Loading configuration from {}", config_path);
        config_builder = config_builder.add_source(config::File::with_name(config_path));
    }

    config_builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize()
        .map_err(Into::into)
}
