//! Unreal Engine project files (.uproject)
//!
//! # Examples
//!
//! ```no_run
//! use unrealmgr::UProject;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Find .uproject file in a project directory
//! let uproject_path = UProject::find("Projects/MyGame")?;
//!
//! // Load and parse it
//! let uproject = UProject::load(&uproject_path)?;
//!
//! println!("Engine version: {}", uproject.engine_association);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Unreal Engine project file (.uproject)
///
/// Only the fields the manager displays are modelled; everything else in the
/// file is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UProject {
    #[serde(rename = "FileVersion", default)]
    pub file_version: i32,

    /// Engine version ("5.3") or the GUID of a source build
    #[serde(rename = "EngineAssociation", default)]
    pub engine_association: String,

    #[serde(rename = "Category", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "CompanyName", skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(rename = "Homepage", skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(rename = "Modules", default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<UProjectModule>,

    #[serde(rename = "Plugins", default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<UProjectPlugin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UProjectModule {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub module_type: Option<String>,

    #[serde(rename = "LoadingPhase", skip_serializing_if = "Option::is_none")]
    pub loading_phase: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UProjectPlugin {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Enabled", default)]
    pub enabled: bool,

    #[serde(rename = "MarketplaceURL", skip_serializing_if = "Option::is_none")]
    pub marketplace_url: Option<String>,
}

impl UProject {
    /// Find the .uproject file in the given directory (not recursive)
    pub fn find<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();

        let mut candidates = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_uproject = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("uproject"))
                .unwrap_or(false);

            if is_uproject && path.is_file() {
                candidates.push(path);
            }
        }

        candidates.sort();
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoUProjectFile(dir.display().to_string()))
    }

    /// Load .uproject file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let uproject: UProject = serde_json::from_str(&content)?;
        Ok(uproject)
    }

    /// Get project name from filename
    pub fn name<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }
}
