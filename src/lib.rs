//! unrealmgr - Asset and project manager for Unreal Engine
//!
//! unrealmgr keeps a local library of Unreal Engine assets and the projects
//! they get used in. It provides:
//!
//! - Importing `.zip` and `.7z` asset archives, with wrapper folders stripped
//!   so the asset lands directly where Unreal expects it
//! - Progress reporting and cooperative cancellation for long imports
//! - A categorised asset library with linked folders and search
//! - A recent-projects list with `.uproject` metadata
//! - Versioned JSON config documents that migrate forward automatically
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use unrealmgr::{ArchiveImporter, ImportOutcome, ProgressCallback};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let progress: ProgressCallback = Arc::new(|msg: &str, current: u64, total: u64| {
//!     println!("[{}/{}] {}", current, total, msg);
//! });
//!
//! let importer = ArchiveImporter::new().with_progress(progress);
//! match importer.import_into_project("Downloads/Forest.zip", "Projects/MyGame")? {
//!     ImportOutcome::Imported(path) => println!("Imported to {}", path.display()),
//!     ImportOutcome::Cancelled => println!("Import cancelled"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`archive`] - Archive format detection and extraction
//! - [`importer`] - Import pipeline and folder normalization
//! - [`config_store`] - Versioned JSON documents with migration
//! - [`library`] - Local asset library
//! - [`projects`] - Recent projects and project metadata
//! - [`uproject`] - `.uproject` file parsing
//! - [`config`] - Config directory location
//! - [`error`] - Error types and result handling

pub mod archive;
pub mod config;
pub mod config_store;
pub mod error;
pub mod importer;
pub mod library;
pub mod projects;
pub mod uproject;

pub use archive::{
    find_archive_files, is_supported_archive, ArchiveFormat, CancellationToken, ProgressCallback,
};
pub use config_store::{compare_versions, ConfigStore};
pub use error::{Error, Result};
pub use importer::{normalize, ArchiveImporter, ImportOutcome};
pub use library::{AssetEntry, AssetLibrary, LibrarySettings, UntrackedFolder};
pub use projects::{content_dir, project_info, ProjectEntry, ProjectInfo, ProjectManager};
pub use uproject::UProject;
