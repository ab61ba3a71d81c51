use vmprep_lib::cli::{
    ResolvedCommand, parse_args, resolve_command, run_list_catalog, run_list_registered,
    run_provision,
};
use vmprep_lib::error::VmPrepError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), VmPrepError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args)?;

    match command {
        ResolvedCommand::Provision(params) => run_provision(params).await?,
        ResolvedCommand::ListCatalog(params) => run_list_catalog(params).await?,
        ResolvedCommand::ListRegistered(params) => run_list_registered(params).await?,
    }

    Ok(())
}
