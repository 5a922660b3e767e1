//! Local asset library
//!
//! Tracks asset folders the user has registered, grouped into categories.
//! Each category can also be linked to folders on disk that are scanned for
//! assets not yet in the library. Everything is persisted in
//! `ue_assets.json` through a [`ConfigStore`], so libraries written by older
//! versions are migrated on open.
//!
//! # Examples
//!
//! ```no_run
//! use unrealmgr::AssetLibrary;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config_dir = unrealmgr::config::ensure_config_dir()?;
//! let mut library = AssetLibrary::open(&config_dir);
//!
//! library.add_category("Environments");
//! library.add_resource("Forest", "/assets/Forest", "Environments", "", true);
//!
//! for asset in library.filtered("Environments", "forest") {
//!     println!("{} -> {}", asset.name, asset.path);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::LIBRARY_FILE;
use crate::config_store::ConfigStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Schema version of `ue_assets.json`
pub const LIBRARY_VERSION: &str = "1.0.0";

/// Virtual category matching every asset; never persisted
pub const ALL_CATEGORY: &str = "All";

/// Category every library starts with; cannot be removed
pub const DEFAULT_CATEGORY: &str = "Default";

const README_FILE: &str = "README.md";

/// Default `ue_assets.json` document
pub fn default_library_document() -> Value {
    json!({
        "resources": [],
        "categories": [DEFAULT_CATEGORY],
        "category_paths": {},
        "settings": {
            "auto_refresh": true,
            "show_preview": true,
            "max_recent_files": 10
        },
        "version": LIBRARY_VERSION,
    })
}

/// One asset folder registered in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub category: String,
    /// Cover image path, empty when unset
    #[serde(default)]
    pub cover: String,
    /// Documentation file path, empty when unset
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub date_added: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySettings {
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default = "default_true")]
    pub show_preview: bool,
    #[serde(default = "default_max_recent_files")]
    pub max_recent_files: u32,
}

fn default_true() -> bool {
    true
}

fn default_max_recent_files() -> u32 {
    10
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            show_preview: true,
            max_recent_files: default_max_recent_files(),
        }
    }
}

/// A folder inside a category path that is not yet a library asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntrackedFolder {
    pub name: String,
    pub path: String,
    pub parent_path: String,
    pub category: String,
}

/// Asset library backed by `ue_assets.json`
pub struct AssetLibrary {
    store: ConfigStore,
    document: Value,
    resources: Vec<AssetEntry>,
    categories: Vec<String>,
    category_paths: BTreeMap<String, Vec<String>>,
}

impl AssetLibrary {
    /// Open the library stored in `config_dir`
    pub fn open<P: AsRef<Path>>(config_dir: P) -> Self {
        let store = ConfigStore::new(
            config_dir.as_ref().join(LIBRARY_FILE),
            LIBRARY_VERSION,
            default_library_document(),
        );
        Self::with_store(store)
    }

    pub fn with_store(store: ConfigStore) -> Self {
        let mut library = Self {
            store,
            document: Value::Null,
            resources: Vec::new(),
            categories: Vec::new(),
            category_paths: BTreeMap::new(),
        };
        library.reload();
        library
    }

    /// Re-read the library from disk, discarding unsaved changes
    pub fn reload(&mut self) {
        self.document = self.store.load();

        self.resources = match self.document.get("resources") {
            Some(value) => parse_list(value, "resource"),
            None => Vec::new(),
        };

        let stored: Vec<String> = match self.document.get("categories") {
            Some(value) => parse_list(value, "category"),
            None => vec![DEFAULT_CATEGORY.to_string()],
        };
        self.categories = vec![ALL_CATEGORY.to_string()];
        for category in stored {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }

        self.category_paths = self
            .document
            .get("category_paths")
            .cloned()
            .and_then(|value| match serde_json::from_value(value) {
                Ok(paths) => Some(paths),
                Err(e) => {
                    warn!("Ignoring malformed category paths: {}", e);
                    None
                }
            })
            .unwrap_or_default();
    }

    /// Write the in-memory library back to disk
    pub fn save(&mut self) -> bool {
        let persisted: Vec<&String> = self
            .categories
            .iter()
            .filter(|c| c.as_str() != ALL_CATEGORY)
            .collect();

        self.document["resources"] = json!(self.resources);
        self.document["categories"] = json!(persisted);
        self.document["category_paths"] = json!(self.category_paths);

        self.store.save(&mut self.document)
    }

    pub fn resources(&self) -> &[AssetEntry] {
        &self.resources
    }

    /// Categories, starting with the virtual `All`
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn settings(&self) -> LibrarySettings {
        self.document
            .get("settings")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    pub fn config_path(&self) -> &Path {
        self.store.path()
    }

    /// Register a new asset and save
    ///
    /// With `create_readme`, a `README.md` stub is written into the asset
    /// folder and recorded as its documentation.
    pub fn add_resource(
        &mut self,
        name: &str,
        path: &str,
        category: &str,
        cover: &str,
        create_readme: bool,
    ) -> bool {
        let doc = if create_readme {
            write_readme(path, name).unwrap_or_default()
        } else {
            String::new()
        };

        self.resources.push(AssetEntry {
            name: name.to_string(),
            path: path.to_string(),
            category: category.to_string(),
            cover: cover.to_string(),
            doc,
            date_added: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });

        self.save()
    }

    /// Edit the asset at `index` and save
    ///
    /// A README is only created when requested and the asset has no
    /// documentation yet.
    pub fn update_resource(
        &mut self,
        index: usize,
        name: &str,
        category: &str,
        path: &str,
        cover: &str,
        create_readme: bool,
    ) -> Result<bool> {
        let resource = self
            .resources
            .get_mut(index)
            .ok_or_else(|| Error::Other(format!("No asset at index {}", index)))?;

        if create_readme && resource.doc.is_empty() {
            if let Some(doc) = write_readme(path, name) {
                resource.doc = doc;
            }
        }

        resource.name = name.to_string();
        resource.category = category.to_string();
        resource.path = path.to_string();
        resource.cover = cover.to_string();

        Ok(self.save())
    }

    /// Remove the asset at `index` from the library (files stay on disk)
    ///
    /// If the library cannot be saved the asset is kept and an error returned.
    pub fn remove_resource(&mut self, index: usize) -> Result<AssetEntry> {
        if index >= self.resources.len() {
            return Err(Error::Other(format!("No asset at index {}", index)));
        }

        let removed = self.resources.remove(index);
        if !self.save() {
            self.resources.insert(index, removed);
            return Err(Error::Other(format!(
                "Failed to save the asset library to {}",
                self.store.path().display()
            )));
        }
        Ok(removed)
    }

    /// Add a category; returns `false` for empty or existing names
    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.categories.iter().any(|c| c == name) {
            return false;
        }

        self.categories.push(name.to_string());
        self.save()
    }

    /// Remove an unused category together with its linked paths
    pub fn remove_category(&mut self, name: &str) -> Result<bool> {
        if name == DEFAULT_CATEGORY || name == ALL_CATEGORY {
            return Err(Error::ProtectedCategory(name.to_string()));
        }

        let count = self.resources.iter().filter(|r| r.category == name).count();
        if count > 0 {
            return Err(Error::CategoryInUse {
                category: name.to_string(),
                count,
            });
        }

        let before = self.categories.len();
        self.categories.retain(|c| c != name);
        if self.categories.len() == before {
            return Ok(false);
        }

        self.category_paths.remove(name);
        Ok(self.save())
    }

    /// Link a folder to a category; returns `false` if already linked
    pub fn add_category_path(&mut self, category: &str, path: &str) -> bool {
        let paths = self.category_paths.entry(category.to_string()).or_default();
        if paths.iter().any(|p| p == path) {
            return false;
        }

        paths.push(path.to_string());
        self.save()
    }

    pub fn remove_category_path(&mut self, category: &str, path: &str) -> bool {
        let Some(paths) = self.category_paths.get_mut(category) else {
            return false;
        };

        let before = paths.len();
        paths.retain(|p| p != path);
        if paths.len() == before {
            return false;
        }

        self.save()
    }

    pub fn category_paths(&self, category: &str) -> &[String] {
        self.category_paths
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `path` is already linked to a category other than `category`
    pub fn is_path_conflict(&self, category: &str, path: &str) -> bool {
        self.category_paths
            .iter()
            .any(|(cat, paths)| cat != category && paths.iter().any(|p| p == path))
    }

    /// Assets in `category` (any category for `All`) whose name or category
    /// contains `search`, ignoring case
    pub fn filtered(&self, category: &str, search: &str) -> Vec<&AssetEntry> {
        let needle = search.trim().to_lowercase();

        self.resources
            .iter()
            .filter(|asset| category == ALL_CATEGORY || asset.category == category)
            .filter(|asset| {
                needle.is_empty()
                    || format!("{} {}", asset.name, asset.category)
                        .to_lowercase()
                        .contains(&needle)
            })
            .collect()
    }

    /// Folders directly inside the category's linked paths that are not yet assets
    pub fn untracked_folders(&self, category: &str) -> Vec<UntrackedFolder> {
        let known: HashSet<&str> = self.resources.iter().map(|r| r.path.as_str()).collect();
        let mut found = Vec::new();

        for parent in self.category_paths(category) {
            let entries = match fs::read_dir(parent) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("Skipping category path {}: {}", parent, e);
                    continue;
                }
            };

            let mut folders: Vec<_> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect();
            folders.sort();

            for folder in folders {
                let path = folder.to_string_lossy().to_string();
                if known.contains(path.as_str()) {
                    continue;
                }
                found.push(UntrackedFolder {
                    name: folder
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    path,
                    parent_path: parent.clone(),
                    category: category.to_string(),
                });
            }
        }

        found
    }
}

fn parse_list<T: serde::de::DeserializeOwned>(value: &Value, what: &str) -> Vec<T> {
    let Some(items) = value.as_array() else {
        warn!("Expected a list of {} entries, ignoring", what);
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed {} entry: {}", what, e);
                None
            }
        })
        .collect()
}

fn write_readme(asset_dir: &str, name: &str) -> Option<String> {
    let readme = Path::new(asset_dir).join(README_FILE);
    match fs::write(&readme, format!("# {}\n\nAsset description...", name)) {
        Ok(()) => Some(readme.to_string_lossy().to_string()),
        Err(e) => {
            warn!("Failed to create {}: {}", readme.display(), e);
            None
        }
    }
}
