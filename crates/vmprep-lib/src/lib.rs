pub mod catalog;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod manifest;
pub mod process;
pub mod verification;
pub mod virtualbox;
pub mod vm_name;

pub use config::Config;
pub use error::VmPrepError;
