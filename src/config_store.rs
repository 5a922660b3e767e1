//! Versioned JSON document storage with forward migration
//!
//! A [`ConfigStore`] owns one JSON file. Every document carries a root
//! `"version"` string; when the file on disk is older than the version the
//! application expects, [`ConfigStore::load`] rebuilds it on top of the
//! current default document so new keys appear with their defaults while
//! every user value survives.
//!
//! Loading never fails: unreadable or corrupt files are replaced by the
//! default document and the problem is logged.
//!
//! # Examples
//!
//! ```no_run
//! use serde_json::json;
//! use unrealmgr::ConfigStore;
//!
//! let store = ConfigStore::new(
//!     "/tmp/unrealmgr/ue_assets.json",
//!     "1.2.0",
//!     json!({ "resources": [], "settings": { "auto_refresh": true } }),
//! );
//!
//! let mut config = store.load();
//! config["settings"]["auto_refresh"] = json!(false);
//! assert!(store.save(&mut config));
//! ```

use crate::Result;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Root key holding the document version
pub const VERSION_KEY: &str = "version";

/// Version assumed for documents without a version field
pub const UNVERSIONED: &str = "0.0.0";

/// Persistent store for one versioned JSON document
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    current_version: String,
    default_document: Value,
}

impl ConfigStore {
    /// Create a store for `path`
    ///
    /// The default document is tagged with `current_version`. A non-object
    /// default is replaced by an empty object. The parent directory is
    /// created if missing.
    pub fn new<P: Into<PathBuf>>(path: P, current_version: &str, default_document: Value) -> Self {
        let path = path.into();

        let mut default_document = default_document;
        if !default_document.is_object() {
            warn!(
                "Default document for {} is not an object ({}), using an empty one",
                path.display(),
                default_document
            );
            default_document = Value::Object(Map::new());
        }
        default_document[VERSION_KEY] = Value::String(current_version.to_string());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!("Failed to create config directory {}: {}", parent.display(), e);
                }
            }
        }

        Self {
            path,
            current_version: current_version.to_string(),
            default_document,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Fresh copy of the default document
    pub fn default_document(&self) -> Value {
        self.default_document.clone()
    }

    /// Load the document, creating or migrating it as needed
    pub fn load(&self) -> Value {
        if !self.path.exists() {
            return self.write_default();
        }

        let document = match self.try_read() {
            Ok(document) => document,
            Err(e) => {
                warn!(
                    "Failed to read config {}: {}, falling back to defaults",
                    self.path.display(),
                    e
                );
                return self.write_default();
            }
        };

        let stored_version = document
            .get(VERSION_KEY)
            .and_then(Value::as_str)
            .unwrap_or(UNVERSIONED)
            .to_string();

        if compare_versions(&stored_version, &self.current_version) == Ordering::Less {
            let mut migrated = self.migrate(&document, &stored_version);
            self.save(&mut migrated);
            return migrated;
        }

        document
    }

    /// Persist `document`, injecting the current version if it has none
    ///
    /// Returns `false` when the write failed; the reason is logged.
    pub fn save(&self, document: &mut Value) -> bool {
        if let Some(map) = document.as_object_mut() {
            map.entry(VERSION_KEY)
                .or_insert_with(|| Value::String(self.current_version.clone()));
        }

        match self.write_document(document) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save config {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Rebuild an old document on top of the current default
    ///
    /// Object values are merged one level deep (old entries win); any other
    /// old value replaces the default outright.
    pub fn migrate(&self, old_document: &Value, old_version: &str) -> Value {
        info!(
            "Migrating {} from version {} to {}",
            self.path.display(),
            old_version,
            self.current_version
        );

        let mut migrated = self.default_document();

        if let (Some(target), Some(old)) = (migrated.as_object_mut(), old_document.as_object()) {
            for (key, old_value) in old {
                if key == VERSION_KEY {
                    continue;
                }

                match (target.get_mut(key), old_value) {
                    (Some(Value::Object(defaults)), Value::Object(old_entries)) => {
                        for (sub_key, sub_value) in old_entries {
                            defaults.insert(sub_key.clone(), sub_value.clone());
                        }
                    }
                    _ => {
                        target.insert(key.clone(), old_value.clone());
                    }
                }
            }
        }

        migrated[VERSION_KEY] = Value::String(self.current_version.clone());
        migrated
    }

    fn try_read(&self) -> Result<Value> {
        let content = fs::read_to_string(&self.path)?;
        let document: Value = serde_json::from_str(&content)?;

        if !document.is_object() {
            return Err(crate::Error::Other(
                "config root is not a JSON object".to_string(),
            ));
        }

        Ok(document)
    }

    fn write_document(&self, document: &Value) -> Result<()> {
        // serde_json leaves non-ASCII characters unescaped
        let content = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn write_default(&self) -> Value {
        let mut document = self.default_document();
        if self.save(&mut document) {
            info!("Created default config {}", self.path.display());
        }
        document
    }
}

/// Compare dotted numeric versions
///
/// Missing trailing components count as zero, so `"1.2"` equals `"1.2.0"`.
/// Pre-release and build metadata are not understood; a component that is
/// not a number counts as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = version_parts(a);
    let right = version_parts(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}

fn version_parts(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| {
            part.trim().parse::<u64>().unwrap_or_else(|_| {
                debug!("Non-numeric version component '{}' in '{}'", part, version);
                0
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir, version: &str, default: Value) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.json"), version, default)
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.2.0", "1.2"), Ordering::Equal);
        assert_eq!(compare_versions("1.10.0", "1.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("0.9.0", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("2", "1.99.99"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "1.0.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.0", "1.0.0") as i32, 0);
        assert_eq!(compare_versions("0.9.0", "1.0.0") as i32, -1);
    }

    #[test]
    fn test_new_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("deeper").join("c.json");

        let _store = ConfigStore::new(&path, "1.0.0", json!({}));
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_load_missing_file_writes_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({ "a": 1, "version": "0.1.0" }));

        let first = store.load();
        let first_bytes = fs::read(store.path()).unwrap();

        fs::remove_file(store.path()).unwrap();
        let second = store.load();
        let second_bytes = fs::read(store.path()).unwrap();

        assert_eq!(first, json!({ "a": 1, "version": "1.0.0" }));
        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn test_load_twice_is_stable() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({ "items": [1, 2] }));

        let first = store.load();
        let first_bytes = fs::read(store.path()).unwrap();
        let second = store.load();
        let second_bytes = fs::read(store.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn test_load_corrupt_file_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({ "a": 0 }));
        fs::write(store.path(), "{ not json").unwrap();

        let loaded = store.load();
        assert_eq!(loaded, json!({ "a": 0, "version": "1.0.0" }));

        // The corrupt file was replaced
        let on_disk: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, loaded);
    }

    #[test]
    fn test_load_non_object_root_falls_back_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({ "a": 0 }));
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        assert_eq!(store.load(), json!({ "a": 0, "version": "1.0.0" }));
    }

    #[test]
    fn test_migration_preserves_old_values() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(
            &temp_dir,
            "1.0.0",
            json!({ "a": 0, "settings": { "x": false, "y": 5 }, "version": "1.0.0" }),
        );
        fs::write(
            store.path(),
            r#"{ "a": 1, "settings": { "x": true }, "version": "0.9.0" }"#,
        )
        .unwrap();

        let loaded = store.load();
        assert_eq!(
            loaded,
            json!({ "a": 1, "settings": { "x": true, "y": 5 }, "version": "1.0.0" })
        );

        // Migrated result was persisted
        let on_disk: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, loaded);
    }

    #[test]
    fn test_migration_replaces_lists_and_keeps_unknown_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(
            &temp_dir,
            "2.0.0",
            json!({ "categories": ["Default", "Props"], "new_key": "fresh" }),
        );

        let old = json!({ "categories": ["Mine"], "legacy": 42 });
        let migrated = store.migrate(&old, "0.0.0");

        assert_eq!(migrated["categories"], json!(["Mine"]));
        assert_eq!(migrated["new_key"], json!("fresh"));
        assert_eq!(migrated["legacy"], json!(42));
        assert_eq!(migrated["version"], json!("2.0.0"));
    }

    #[test]
    fn test_migration_does_not_leak_into_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({ "settings": { "x": false } }));

        let _ = store.migrate(&json!({ "settings": { "x": true, "z": 1 } }), "0.5.0");
        assert_eq!(store.default_document()["settings"], json!({ "x": false }));
    }

    #[test]
    fn test_unversioned_file_is_migrated() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({ "a": 0, "b": "default" }));
        fs::write(store.path(), r#"{ "a": 7 }"#).unwrap();

        assert_eq!(
            store.load(),
            json!({ "a": 7, "b": "default", "version": "1.0.0" })
        );
    }

    #[test]
    fn test_newer_version_is_returned_unmodified() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({ "a": 0, "b": 1 }));
        fs::write(store.path(), r#"{ "a": 3, "version": "2.0.0" }"#).unwrap();

        assert_eq!(store.load(), json!({ "a": 3, "version": "2.0.0" }));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({}));

        let mut document = json!({
            "name": "Ünreal 资源",
            "nested": { "list": [1, 2.5, null, true], "empty": {} },
        });
        assert!(store.save(&mut document));

        let loaded = store.load();
        assert_eq!(loaded, document);
        assert_eq!(loaded["version"], json!("1.0.0"));
    }

    #[test]
    fn test_save_keeps_existing_version_and_writes_readable_json() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir, "1.0.0", json!({}));

        let mut document = json!({ "label": "默认", "version": "0.5.0" });
        assert!(store.save(&mut document));

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("默认"), "non-ASCII should stay unescaped");
        assert!(content.contains("\n  \""), "output should be indented");
        assert!(content.contains("0.5.0"));
    }

    #[test]
    fn test_save_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        // A directory standing where the file should be makes the write fail
        let path = temp_dir.path().join("config.json");
        fs::create_dir_all(&path).unwrap();
        let store = ConfigStore::new(&path, "1.0.0", json!({}));

        assert!(!store.save(&mut json!({ "a": 1 })));
    }
}
