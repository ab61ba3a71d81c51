//! The catalog's VM manifest: operating systems, the virtualization software
//! each image is packaged for, and per-browser chunk sets.

use crate::download::ChunkFile;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Software list not found for OS: {os_name}")]
    OsNotFound { os_name: String },

    #[error("Browsers not found for software: {software_name}")]
    SoftwareNotFound { software_name: String },

    #[error("Files not found for version: {version}, OS version: {os_version}")]
    BrowserNotFound { version: String, os_version: String },
}

/// Selects one chunk set in the manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserSpec {
    pub os_name: String,
    pub software_name: String,
    pub version: String,
    pub os_version: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OsEntry {
    os_name: String,
    #[serde(default)]
    software_list: Vec<SoftwareEntry>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SoftwareEntry {
    software_name: String,
    #[serde(default)]
    browsers: Vec<BrowserEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserEntry {
    pub version: String,
    pub os_version: String,
    #[serde(default)]
    pub files: Vec<ChunkFile>,
}

#[derive(Clone, Debug)]
pub struct Manifest {
    os_list: Vec<OsEntry>,
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self, ManifestError> {
        let os_list = serde_json::from_str(json)?;
        Ok(Self { os_list })
    }

    fn software(&self, os_name: &str) -> Result<&[SoftwareEntry], ManifestError> {
        self.os_list
            .iter()
            .find(|os| os.os_name == os_name)
            .map(|os| os.software_list.as_slice())
            .ok_or_else(|| ManifestError::OsNotFound {
                os_name: os_name.to_string(),
            })
    }

    /// All browser images packaged for `software_name` on `os_name`.
    pub fn browsers(&self, os_name: &str, software_name: &str) -> Result<&[BrowserEntry], ManifestError> {
        self.software(os_name)?
            .iter()
            .find(|software| software.software_name == software_name)
            .map(|software| software.browsers.as_slice())
            .ok_or_else(|| ManifestError::SoftwareNotFound {
                software_name: software_name.to_string(),
            })
    }

    /// The ordered chunk set for `spec`.
    pub fn files_for_browser(&self, spec: &BrowserSpec) -> Result<&[ChunkFile], ManifestError> {
        self.browsers(&spec.os_name, &spec.software_name)?
            .iter()
            .find(|browser| browser.version == spec.version && browser.os_version == spec.os_version)
            .map(|browser| browser.files.as_slice())
            .ok_or_else(|| ManifestError::BrowserNotFound {
                version: spec.version.clone(),
                os_version: spec.os_version.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"[
        {
            "osName": "Windows",
            "softwareList": [{"softwareName": "HyperV", "browsers": []}]
        },
        {
            "osName": "Mac",
            "softwareList": [
                {
                    "softwareName": "VirtualBox",
                    "browsers": [
                        {
                            "version": "8",
                            "osVersion": "XP",
                            "build": "20140407",
                            "files": [
                                {"md5": "http://h/IE8.XP.md5.txt", "url": "http://h/IE8.XP.For.Mac.VirtualBox.ova.zip"}
                            ]
                        },
                        {
                            "version": "11",
                            "osVersion": "Win8.1",
                            "files": [
                                {"md5": "http://h/p1.md5.txt", "url": "http://h/IE11.Win8.1.part1.sfx"},
                                {"md5": "http://h/p2.md5.txt", "url": "http://h/IE11.Win8.1.part2.rar"}
                            ]
                        }
                    ]
                }
            ]
        }
    ]"#;

    fn spec(version: &str, os_version: &str) -> BrowserSpec {
        BrowserSpec {
            os_name: "Mac".to_string(),
            software_name: "VirtualBox".to_string(),
            version: version.to_string(),
            os_version: os_version.to_string(),
        }
    }

    #[test]
    fn test_files_for_browser_keeps_order() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let files = manifest.files_for_browser(&spec("11", "Win8.1")).unwrap();

        assert_eq!(
            files,
            &[
                ChunkFile::new("http://h/p1.md5.txt", "http://h/IE11.Win8.1.part1.sfx"),
                ChunkFile::new("http://h/p2.md5.txt", "http://h/IE11.Win8.1.part2.rar"),
            ]
        );
    }

    #[test]
    fn test_browsers_lists_every_entry() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let browsers = manifest.browsers("Mac", "VirtualBox").unwrap();

        let versions: Vec<_> = browsers
            .iter()
            .map(|b| (b.version.as_str(), b.os_version.as_str()))
            .collect();
        assert_eq!(versions, vec![("8", "XP"), ("11", "Win8.1")]);
    }

    #[test]
    fn test_unknown_os() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut selector = spec("11", "Win8.1");
        selector.os_name = "Linux".to_string();

        let err = manifest.files_for_browser(&selector).unwrap_err();
        assert_eq!(err.to_string(), "Software list not found for OS: Linux");
    }

    #[test]
    fn test_unknown_software() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let err = manifest.browsers("Mac", "Parallels").unwrap_err();
        assert!(matches!(err, ManifestError::SoftwareNotFound { .. }));
    }

    #[test]
    fn test_unknown_browser_version() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let err = manifest.files_for_browser(&spec("11", "Win7")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Files not found for version: 11, OS version: Win7"
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Manifest::parse("{not json"),
            Err(ManifestError::Parse(_))
        ));
    }
}
