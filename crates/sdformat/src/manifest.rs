//! Per-model manifest files and SDF version resolution
//!
//! Every model directory carries a `model.config` manifest declaring the
//! model's display name and one SDF file per supported format version:
//!
//! ```xml
//! <model>
//!     <name>versioned model</name>
//!     <sdf version="1.3">model-1.3.sdf</sdf>
//!     <sdf version="1.5">model.sdf</sdf>
//! </model>
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Manifest file name inside a model directory.
pub const MANIFEST_FILE: &str = "model.config";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    Parse(String),
    #[error("manifest entry missing {0}")]
    MissingField(&'static str),
    #[error("invalid SDF version {0:?}")]
    InvalidVersion(String),
}

/// An SDF format version, encoded as an integer that preserves numeric
/// ordering of the dotted version string: "1.5" is 150, "1.3" is 130.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SdfVersion(u32);

impl SdfVersion {
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    pub const fn code(self) -> u32 {
        self.0
    }
}

impl FromStr for SdfVersion {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ManifestError::InvalidVersion(s.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ManifestError::InvalidVersion(s.to_string()));
        }
        Ok(Self((value * 100.0).round() as u32))
    }
}

impl From<u32> for SdfVersion {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for SdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 as f64 / 100.0)
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,
    #[serde(default, rename = "sdf")]
    sdf: Vec<RawSdfEntry>,
}

#[derive(Debug, Deserialize)]
struct RawSdfEntry {
    #[serde(rename = "@version")]
    version: Option<String>,
    #[serde(rename = "$text")]
    path: Option<String>,
}

/// A model's on-disk manifest: display name plus the available SDF
/// versions and their file paths (relative to the model directory).
#[derive(Debug, Clone)]
pub struct ModelManifest {
    name: String,
    versions: BTreeMap<SdfVersion, PathBuf>,
}

impl ModelManifest {
    /// Parse a manifest from its XML text.
    pub fn from_xml(xml: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest =
            quick_xml::de::from_str(xml).map_err(|e| ManifestError::Parse(e.to_string()))?;

        let mut versions = BTreeMap::new();
        for entry in raw.sdf {
            let version = entry
                .version
                .ok_or(ManifestError::MissingField("version attribute on <sdf>"))?
                .parse::<SdfVersion>()?;
            let path = entry
                .path
                .ok_or(ManifestError::MissingField("file path in <sdf>"))?;
            versions.insert(version, PathBuf::from(path));
        }

        Ok(Self {
            name: raw.name,
            versions,
        })
    }

    /// Read the `model.config` manifest from a model directory.
    pub fn from_dir(dir: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(dir.join(MANIFEST_FILE))?;
        Self::from_xml(&content)
    }

    /// The model's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn versions(&self) -> &BTreeMap<SdfVersion, PathBuf> {
        &self.versions
    }

    /// Pick the SDF file to load: the greatest declared version, or with a
    /// constraint the greatest version not exceeding it. `None` when no
    /// declared version qualifies, including a manifest with zero entries.
    pub fn latest(&self, max_version: Option<SdfVersion>) -> Option<(SdfVersion, &Path)> {
        let entry = match max_version {
            None => self.versions.iter().next_back(),
            Some(max) => self.versions.range(..=max).next_back(),
        };
        entry.map(|(v, p)| (*v, p.as_path()))
    }
}
