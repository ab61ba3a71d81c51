mod args;
mod list;
mod params;
mod provision;
mod resolved_command;

pub use args::{Args, Command, parse_args};
pub use list::{catalog_names, run_list_catalog, run_list_registered};
pub use params::{ListCatalogParams, ListRegisteredParams, ProvisionParams};
pub use provision::run_provision;
pub use resolved_command::{ResolvedCommand, resolve_command};
