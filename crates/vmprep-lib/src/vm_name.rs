use crate::manifest::{BrowserSpec, Manifest, ManifestError};
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

pub const BROWSER_OS_SEPARATOR: &str = " - ";
const BROWSER_PREFIX: &str = "IE";

/// (VM name OS version, manifest OS version)
const OS_VERSIONS: &[(&str, &str)] = &[
    ("WinXP", "XP"),
    ("Vista", "Vista"),
    ("Win7", "Win7"),
    ("Win8", "Win8"),
    ("Win8.1", "Win8.1"),
    ("Win10", "Win10"),
];

/// Lookup between the OS version spelled in VM names and the one used in the
/// manifest. Built once, never mutated.
pub struct OsVersionTable {
    to_manifest: HashMap<&'static str, &'static str>,
    to_vm_name: HashMap<&'static str, &'static str>,
}

impl OsVersionTable {
    fn new(pairs: &[(&'static str, &'static str)]) -> Self {
        Self {
            to_manifest: pairs.iter().copied().collect(),
            to_vm_name: pairs.iter().map(|&(vm, manifest)| (manifest, vm)).collect(),
        }
    }

    pub fn manifest_os_version(&self, vm_os_version: &str) -> Option<&'static str> {
        self.to_manifest.get(vm_os_version).copied()
    }

    pub fn vm_os_version(&self, manifest_os_version: &str) -> Option<&'static str> {
        self.to_vm_name.get(manifest_os_version).copied()
    }
}

pub static OS_VERSION_TABLE: LazyLock<OsVersionTable> =
    LazyLock::new(|| OsVersionTable::new(OS_VERSIONS));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VmNameError {
    #[error("Invalid browser version in VM name: {0}")]
    InvalidBrowserVersion(String),

    #[error("Unknown OS version in VM name: {0}")]
    UnknownOsVersion(String),
}

/// A VM name such as `IE11 - Win8.1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmName {
    name: String,
    browser_version: String,
    os_version: String,
}

impl VmName {
    pub fn parse(name: &str) -> Result<Self, VmNameError> {
        let invalid = || VmNameError::InvalidBrowserVersion(name.to_string());

        let (browser, os_version) = name.split_once(BROWSER_OS_SEPARATOR).ok_or_else(invalid)?;
        let browser_version = browser.strip_prefix(BROWSER_PREFIX).ok_or_else(invalid)?;
        if browser_version.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            browser_version: browser_version.to_string(),
            os_version: os_version.to_string(),
        })
    }

    /// Name for a manifest entry, or `None` when its OS version is not one we
    /// know how to name.
    pub fn from_browser(version: &str, manifest_os_version: &str) -> Option<Self> {
        let os_version = OS_VERSION_TABLE.vm_os_version(manifest_os_version)?;
        Some(Self {
            name: format!("{BROWSER_PREFIX}{version}{BROWSER_OS_SEPARATOR}{os_version}"),
            browser_version: version.to_string(),
            os_version: os_version.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn browser_version(&self) -> &str {
        &self.browser_version
    }

    /// OS version as written in the VM name (`WinXP`, `Win8.1`, ...).
    pub fn os_version(&self) -> &str {
        &self.os_version
    }

    pub fn ova_file_name(&self) -> String {
        format!("{}.ova", self.name)
    }

    pub fn to_browser_spec(&self, os_name: &str, software_name: &str) -> Result<BrowserSpec, VmNameError> {
        let os_version = OS_VERSION_TABLE
            .manifest_os_version(&self.os_version)
            .ok_or_else(|| VmNameError::UnknownOsVersion(self.name.clone()))?;

        Ok(BrowserSpec {
            os_name: os_name.to_string(),
            software_name: software_name.to_string(),
            version: self.browser_version.clone(),
            os_version: os_version.to_string(),
        })
    }
}

impl fmt::Display for VmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Sorted names of every VM the catalog offers for this OS and software.
pub fn catalog_vm_names(
    manifest: &Manifest,
    os_name: &str,
    software_name: &str,
) -> Result<Vec<String>, ManifestError> {
    let names = manifest
        .browsers(os_name, software_name)?
        .iter()
        .filter_map(|browser| {
            let name = VmName::from_browser(&browser.version, &browser.os_version);
            if name.is_none() {
                tracing::debug!(
                    version = %browser.version,
                    os_version = %browser.os_version,
                    "Skipping catalog entry with unknown OS version"
                );
            }
            name
        })
        .map(|name| name.to_string())
        .sorted()
        .dedup()
        .collect();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vm_name() {
        let name = VmName::parse("IE11 - Win8.1").unwrap();
        assert_eq!(name.browser_version(), "11");
        assert_eq!(name.os_version(), "Win8.1");
        assert_eq!(name.ova_file_name(), "IE11 - Win8.1.ova");
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert_eq!(
            VmName::parse("IE11-Win8.1"),
            Err(VmNameError::InvalidBrowserVersion("IE11-Win8.1".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_other_browsers() {
        assert!(VmName::parse("Edge - Win10").is_err());
        assert!(VmName::parse("IE - Win10").is_err());
    }

    #[test]
    fn test_browser_spec_maps_os_version() {
        let spec = VmName::parse("IE8 - WinXP")
            .unwrap()
            .to_browser_spec("Mac", "VirtualBox")
            .unwrap();
        assert_eq!(
            spec,
            BrowserSpec {
                os_name: "Mac".to_string(),
                software_name: "VirtualBox".to_string(),
                version: "8".to_string(),
                os_version: "XP".to_string(),
            }
        );
    }

    #[test]
    fn test_browser_spec_unknown_os_version() {
        let err = VmName::parse("IE11 - Win95")
            .unwrap()
            .to_browser_spec("Mac", "VirtualBox")
            .unwrap_err();
        assert_eq!(err, VmNameError::UnknownOsVersion("IE11 - Win95".to_string()));
    }

    #[test]
    fn test_table_is_bidirectional() {
        for &(vm, manifest) in OS_VERSIONS {
            assert_eq!(OS_VERSION_TABLE.manifest_os_version(vm), Some(manifest));
            assert_eq!(OS_VERSION_TABLE.vm_os_version(manifest), Some(vm));
        }
        assert_eq!(OS_VERSION_TABLE.vm_os_version("WinXP"), None);
    }

    #[test]
    fn test_from_browser() {
        let name = VmName::from_browser("8", "XP").unwrap();
        assert_eq!(name.as_str(), "IE8 - WinXP");
        assert_eq!(VmName::from_browser("11", "Win95"), None);
    }

    #[test]
    fn test_catalog_vm_names_sorted() {
        let manifest = Manifest::parse(
            r#"[{"osName": "Mac", "softwareList": [{"softwareName": "VirtualBox", "browsers": [
                {"version": "11", "osVersion": "Win7", "files": []},
                {"version": "10", "osVersion": "Win7", "files": []},
                {"version": "6", "osVersion": "Win2000", "files": []},
                {"version": "8", "osVersion": "XP", "files": []}
            ]}]}]"#,
        )
        .unwrap();

        let names = catalog_vm_names(&manifest, "Mac", "VirtualBox").unwrap();

        assert_eq!(names, vec!["IE10 - Win7", "IE11 - Win7", "IE8 - WinXP"]);
    }
}
