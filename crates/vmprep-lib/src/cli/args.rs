use clap::{ArgAction, Parser};
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Provision { vm_name: String },
    ListCatalog,
    ListRegistered,
}

#[derive(Debug, Clone)]
pub struct Args {
    pub command: Command,
    pub config_path: Option<String>,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "vmprep",
    version,
    about = "Download, verify and provision prebuilt browser-testing virtual machines in VirtualBox"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count
    )]
    verbose: u8,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Sets a custom config file"
    )]
    config: Option<String>,

    #[arg(
        short = 'l',
        long = "list",
        help = "Lists the VMs available in the catalog",
        conflicts_with = "list_registered"
    )]
    list: bool,

    #[arg(
        short = 'L',
        long = "list-registered",
        help = "Lists the catalog VMs already registered in VirtualBox"
    )]
    list_registered: bool,

    #[arg(
        value_name = "VM_NAME",
        help = "VM to provision, e.g. \"IE11 - Win8.1\"",
        required_unless_present_any = ["list", "list_registered"],
        conflicts_with_all = ["list", "list_registered"]
    )]
    vm_name: Option<String>,
}

impl From<Cli> for Args {
    fn from(cli: Cli) -> Self {
        let log_level = match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let command = match (cli.list, cli.list_registered, cli.vm_name) {
            (true, _, _) => Command::ListCatalog,
            (_, true, _) => Command::ListRegistered,
            // clap requires a VM name when neither list flag is present
            (_, _, vm_name) => Command::Provision {
                vm_name: vm_name.unwrap_or_default(),
            },
        };

        Args {
            command,
            config_path: cli.config,
            log_level,
        }
    }
}

pub fn parse_args() -> Args {
    let args = Args::from(Cli::parse());

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(args.log_level.into())
                .from_env_lossy(),
        )
        .init();

    args
}
