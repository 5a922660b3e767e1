//! Recent Unreal projects and project metadata
//!
//! The recent-project list is persisted in `ue_projects.json` through a
//! [`ConfigStore`]. Locating projects on disk is left to the caller; this
//! module only works with `.uproject` paths it is handed.
//!
//! # Examples
//!
//! ```no_run
//! use unrealmgr::{ProjectEntry, ProjectManager};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config_dir = unrealmgr::config::ensure_config_dir()?;
//! let mut projects = ProjectManager::open(&config_dir);
//!
//! projects.add_recent(ProjectEntry::from_uproject("Projects/MyGame/MyGame.uproject")?);
//! for project in projects.recent_projects() {
//!     println!("{} ({})", project.name, project.path.display());
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::PROJECTS_FILE;
use crate::config_store::ConfigStore;
use crate::uproject::UProject;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Schema version of `ue_projects.json`
pub const PROJECTS_VERSION: &str = "1.0.0";

/// Recent list is capped at this many entries
pub const MAX_RECENT_PROJECTS: usize = 10;

/// Folder inside a project where Unreal discovers assets
pub const CONTENT_DIR: &str = "Content";

/// Default `ue_projects.json` document
pub fn default_projects_document() -> Value {
    json!({
        "recent_projects": [],
        "last_updated": null,
        "version": PROJECTS_VERSION,
    })
}

/// A project remembered in the recent list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    /// Path of the .uproject file
    pub path: PathBuf,
    /// Directory containing the .uproject file
    pub dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<String>,
}

impl ProjectEntry {
    pub fn from_uproject<P: AsRef<Path>>(uproject_path: P) -> Result<Self> {
        let path = uproject_path.as_ref();

        let name = UProject::name(path)
            .ok_or_else(|| Error::Other(format!("Invalid project path: {}", path.display())))?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            name,
            path: path.to_path_buf(),
            dir,
            last_opened: None,
        })
    }
}

/// Summary of a .uproject file for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub engine_version: String,
    pub description: String,
    pub category: String,
    pub company: String,
    pub homepage: String,
    pub plugins: usize,
    pub modules: usize,
}

/// Read display information from a .uproject file
///
/// Returns `None` (and logs) when the file is missing or unparsable.
pub fn project_info<P: AsRef<Path>>(uproject_path: P) -> Option<ProjectInfo> {
    let path = uproject_path.as_ref();
    if !path.is_file() {
        return None;
    }

    match UProject::load(path) {
        Ok(uproject) => Some(ProjectInfo {
            engine_version: if uproject.engine_association.is_empty() {
                "Unknown".to_string()
            } else {
                uproject.engine_association
            },
            description: uproject.description.unwrap_or_default(),
            category: uproject.category.unwrap_or_default(),
            company: uproject.company_name.unwrap_or_default(),
            homepage: uproject.homepage.unwrap_or_default(),
            plugins: uproject.plugins.len(),
            modules: uproject.modules.len(),
        }),
        Err(e) => {
            warn!("Failed to read project info from {}: {}", path.display(), e);
            None
        }
    }
}

/// The project's `Content` directory, created if absent
///
/// Accepts either the project directory or its .uproject file.
pub fn content_dir<P: AsRef<Path>>(project: P) -> Result<PathBuf> {
    let project = project.as_ref();
    let project_dir = if project.is_file() {
        project.parent().unwrap_or(Path::new("."))
    } else {
        project
    };

    let content = project_dir.join(CONTENT_DIR);
    if !content.exists() {
        fs::create_dir_all(&content)?;
        info!("Created Content directory {}", content.display());
    }
    Ok(content)
}

/// Recent-project list backed by `ue_projects.json`
pub struct ProjectManager {
    store: ConfigStore,
    document: Value,
    recent: Vec<ProjectEntry>,
}

impl ProjectManager {
    /// Open the project list stored in `config_dir`
    pub fn open<P: AsRef<Path>>(config_dir: P) -> Self {
        let store = ConfigStore::new(
            config_dir.as_ref().join(PROJECTS_FILE),
            PROJECTS_VERSION,
            default_projects_document(),
        );
        Self::with_store(store)
    }

    pub fn with_store(store: ConfigStore) -> Self {
        let document = store.load();
        let recent = parse_entries(&document["recent_projects"]);
        Self {
            store,
            document,
            recent,
        }
    }

    /// Recent projects, most recent first
    ///
    /// Entries whose .uproject file no longer exists are dropped and the
    /// pruned list is saved.
    pub fn recent_projects(&mut self) -> &[ProjectEntry] {
        let before = self.recent.len();
        self.recent.retain(|p| p.path.exists());

        if self.recent.len() != before {
            info!("Dropped {} missing project(s)", before - self.recent.len());
            self.save();
        }

        &self.recent
    }

    /// Put a project at the front of the recent list and save
    pub fn add_recent(&mut self, mut project: ProjectEntry) -> bool {
        self.recent.retain(|p| p.path != project.path);

        project.last_opened = Some(chrono::Local::now().to_rfc3339());
        self.recent.insert(0, project);
        self.recent.truncate(MAX_RECENT_PROJECTS);

        self.save()
    }

    pub fn save(&mut self) -> bool {
        match serde_json::to_value(&self.recent) {
            Ok(list) => self.document["recent_projects"] = list,
            Err(e) => {
                warn!("Failed to serialize recent projects: {}", e);
                return false;
            }
        }
        self.document["last_updated"] = Value::String(chrono::Local::now().to_rfc3339());

        self.store.save(&mut self.document)
    }
}

fn parse_entries(value: &Value) -> Vec<ProjectEntry> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed recent project entry: {}", e);
                None
            }
        })
        .collect()
}
