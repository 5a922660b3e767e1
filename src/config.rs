//! Location of the user configuration directory
//!
//! Every managed document (asset library, project list) lives as its own JSON
//! file inside one per-user directory:
//!
//! - `UNREALMGR_CONFIG_DIR` when set (useful for testing)
//! - otherwise the platform config directory (`%APPDATA%`, `~/.config`,
//!   `~/Library/Application Support`) joined with `UnrealManagerTools`
//! - otherwise `~/.UnrealManagerTools`
//!
//! # Examples
//!
//! ```no_run
//! use unrealmgr::config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = config::ensure_config_dir()?;
//! println!("Library config: {}", dir.join(config::LIBRARY_FILE).display());
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use std::fs;
use std::path::PathBuf;

/// Application folder name under the platform config directory
pub const APP_NAME: &str = "UnrealManagerTools";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "UNREALMGR_CONFIG_DIR";

/// Asset library document
pub const LIBRARY_FILE: &str = "ue_assets.json";

/// Recent projects document
pub const PROJECTS_FILE: &str = "ue_projects.json";

/// Resolve the config directory without touching the filesystem
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    if let Some(base) = dirs::config_dir() {
        return Ok(base.join(APP_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::Other("Could not find home directory".to_string()))?;

    Ok(home.join(format!(".{}", APP_NAME)))
}

/// Resolve the config directory and create it if it doesn't exist
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir()?;
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
