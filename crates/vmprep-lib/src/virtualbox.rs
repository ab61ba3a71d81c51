use crate::process::{self, ExitStatus, ProcessError};
use crate::vm_name::{OS_VERSION_TABLE, VmName};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

pub const DEFAULT_VBOXMANAGE: &str = "VBoxManage";
pub const FIRST_SNAPSHOT_NAME: &str = "Snapshot 1";

#[derive(Error, Debug)]
pub enum VirtualBoxError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("VBoxManage {action} \"{subject}\" failed with {status}")]
    CommandFailed {
        action: &'static str,
        subject: String,
        status: ExitStatus,
    },

    #[error("Unsupported OS version for VM memory settings: {0}")]
    UnsupportedOsVersion(String),
}

const SMALL_MEMORY: &[&str] = &["--memory", "1024"];
const LARGE_MEMORY: &[&str] = &["--memory", "2048", "--vram", "128"];

/// Memory settings applied after import, keyed by the VM's OS version.
pub fn memory_args(os_version: &str) -> Result<&'static [&'static str], VirtualBoxError> {
    match os_version {
        "WinXP" | "Vista" => Ok(SMALL_MEMORY),
        "Win7" | "Win8" | "Win8.1" => Ok(LARGE_MEMORY),
        other => Err(VirtualBoxError::UnsupportedOsVersion(other.to_string())),
    }
}

/// Picks the provisionable VM names out of `VBoxManage list vms` output.
pub fn parse_vm_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix('"')?;
            let (name, _) = rest.split_once('"')?;
            is_provisionable_name(name).then(|| name.to_string())
        })
        .collect()
}

/// `IE<version> - <OS version>` where the OS version is one we can provision.
fn is_provisionable_name(name: &str) -> bool {
    VmName::parse(name).is_ok_and(|vm| {
        vm.browser_version()
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
            && OS_VERSION_TABLE.manifest_os_version(vm.os_version()).is_some()
    })
}

/// Thin driver for the `VBoxManage` command-line tool.
#[derive(Clone, Debug)]
pub struct VBoxManage {
    program: PathBuf,
}

impl Default for VBoxManage {
    fn default() -> Self {
        Self::new(DEFAULT_VBOXMANAGE)
    }
}

impl VBoxManage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(args);
        command
    }

    async fn run_checked<I, S>(&self, action: &'static str, subject: &str, args: I) -> Result<(), VirtualBoxError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let status = process::run(&mut self.command(args)).await?;
        if status.success() {
            Ok(())
        } else {
            Err(VirtualBoxError::CommandFailed {
                action,
                subject: subject.to_string(),
                status,
            })
        }
    }

    /// `showvminfo` exits non-zero for unknown VMs.
    pub async fn vm_exists(&self, vm: &VmName) -> Result<bool, VirtualBoxError> {
        let mut command = self.command(["showvminfo", vm.as_str()]);
        command.stdout(Stdio::null());
        command.stderr(Stdio::null());
        let status = process::run(&mut command).await?;
        Ok(status.success())
    }

    pub async fn registered_vm_names(&self) -> Result<Vec<String>, VirtualBoxError> {
        let (status, stdout) = process::run_captured(&mut self.command(["list", "vms"])).await?;
        if !status.success() {
            return Err(VirtualBoxError::CommandFailed {
                action: "list",
                subject: "vms".to_string(),
                status,
            });
        }
        Ok(parse_vm_list(&stdout))
    }

    pub async fn start_vm(&self, vm: &VmName) -> Result<(), VirtualBoxError> {
        tracing::info!(vm = %vm, "Starting VM");
        self.run_checked("startvm", vm.as_str(), ["startvm", vm.as_str(), "--type", "gui"])
            .await
    }

    /// Imports `ova_path`, sizes memory, attaches the guest additions and
    /// takes the first snapshot.
    pub async fn import_and_configure(&self, vm: &VmName, ova_path: &Path) -> Result<(), VirtualBoxError> {
        tracing::info!(vm = %vm, ova = %ova_path.display(), "Importing VM");
        let ova = ova_path.display().to_string();
        self.run_checked("import", &ova, [OsStr::new("import"), ova_path.as_os_str()])
            .await?;

        let memory = memory_args(vm.os_version())?;
        self.run_checked(
            "modifyvm",
            vm.as_str(),
            ["modifyvm", vm.as_str()].into_iter().chain(memory.iter().copied()),
        )
        .await?;

        self.run_checked(
            "storageattach",
            vm.as_str(),
            [
                "storageattach",
                vm.as_str(),
                "--storagectl",
                "IDE",
                "--port",
                "1",
                "--device",
                "0",
                "--type",
                "dvddrive",
                "--medium",
                "additions",
            ],
        )
        .await?;

        self.run_checked(
            "snapshot",
            vm.as_str(),
            ["snapshot", vm.as_str(), "take", FIRST_SNAPSHOT_NAME],
        )
        .await
    }

    pub async fn set_clipboard_mode(&self, vm: &VmName, mode: &str) -> Result<(), VirtualBoxError> {
        self.run_checked(
            "controlvm",
            vm.as_str(),
            ["controlvm", vm.as_str(), "clipboard", mode],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vm_list() {
        let output = r#""IE11 - Win8.1" {4b1e7d2a-0000-0000-0000-000000000001}
"IE8 - WinXP" {4b1e7d2a-0000-0000-0000-000000000002}
"Ubuntu 24.04" {4b1e7d2a-0000-0000-0000-000000000003}
"IE10 - Win7 (clone)" {4b1e7d2a-0000-0000-0000-000000000004}
"IEx - Win7" {4b1e7d2a-0000-0000-0000-000000000005}
"#;
        assert_eq!(parse_vm_list(output), vec!["IE11 - Win8.1", "IE8 - WinXP"]);
    }

    #[test]
    fn test_parse_vm_list_empty() {
        assert!(parse_vm_list("").is_empty());
    }

    #[test]
    fn test_memory_args() {
        assert_eq!(memory_args("WinXP").unwrap(), &["--memory", "1024"]);
        assert_eq!(memory_args("Vista").unwrap(), &["--memory", "1024"]);
        assert_eq!(
            memory_args("Win8.1").unwrap(),
            &["--memory", "2048", "--vram", "128"]
        );
    }

    #[test]
    fn test_memory_args_unsupported() {
        let err = memory_args("Win10").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported OS version for VM memory settings: Win10"
        );
    }

    #[tokio::test]
    async fn test_missing_vboxmanage_is_launch_error() {
        let vbox = VBoxManage::new("/nonexistent/VBoxManage");
        let vm = VmName::parse("IE11 - Win8.1").unwrap();

        let err = vbox.vm_exists(&vm).await.unwrap_err();

        assert!(matches!(
            err,
            VirtualBoxError::Process(ProcessError::Launch { .. })
        ));
    }
}
