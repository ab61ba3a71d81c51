use crate::cli::args::{Args, Command};
use crate::cli::params::{ListCatalogParams, ListRegisteredParams, ProvisionParams};
use crate::config::load_config;
use crate::error::VmPrepError;
use crate::vm_name::VmName;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Provision(ProvisionParams),
    ListCatalog(ListCatalogParams),
    ListRegistered(ListRegisteredParams),
}

pub fn resolve_command(args: Args) -> Result<ResolvedCommand, VmPrepError> {
    let config = load_config(args.config_path.as_deref())?;

    match args.command {
        Command::Provision { vm_name } => {
            let vm_name = VmName::parse(&vm_name)?;
            Ok(ResolvedCommand::Provision(ProvisionParams { vm_name, config }))
        }
        Command::ListCatalog => Ok(ResolvedCommand::ListCatalog(ListCatalogParams { config })),
        Command::ListRegistered => Ok(ResolvedCommand::ListRegistered(ListRegisteredParams {
            vboxmanage: config.vboxmanage,
        })),
    }
}
