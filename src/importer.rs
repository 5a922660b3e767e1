//! Archive import: extract, normalize and place an asset archive
//!
//! Asset archives are often packaged with accidental wrapper folders
//! (`Forest/Forest/Maps/...`). The importer extracts into a private scratch
//! directory, collapses those wrappers, and moves the real asset folder into
//! the destination under a name derived from the archive. The scratch
//! directory is removed on every exit path.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use unrealmgr::{ArchiveImporter, ImportOutcome, ProgressCallback};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let progress: ProgressCallback = Arc::new(|msg, current, total| {
//!     println!("{} ({}/{})", msg, current, total);
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

use crate::archive::{extract, ArchiveFormat, CancellationToken, Extraction, ProgressCallback};
use crate::{Error, Result};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Upper bound on wrapper folders collapsed by [`normalize`]
pub const MAX_NORMALIZE_DEPTH: usize = 10;

/// Result of a finished import job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Content now lives at this path
    Imported(PathBuf),
    /// The job was cancelled; nothing was placed
    Cancelled,
}

impl ImportOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, Self::Imported(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Imported(path) => Some(path),
            Self::Cancelled => None,
        }
    }
}

/// Drives extract → normalize → place for one archive at a time
#[derive(Clone)]
pub struct ArchiveImporter {
    scratch_root: PathBuf,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Default for ArchiveImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveImporter {
    /// Importer using the system temp directory for scratch space
    pub fn new() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Directory under which per-job scratch directories are created
    pub fn with_scratch_root<P: Into<PathBuf>>(mut self, scratch_root: P) -> Self {
        self.scratch_root = scratch_root.into();
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Import one archive into `destination_root`
    ///
    /// The content lands in `destination_root/<archive stem>`, or
    /// `<archive stem>_1`, `_2`, … when that name is taken.
    pub fn import<A: AsRef<Path>, D: AsRef<Path>>(
        &self,
        archive_path: A,
        destination_root: D,
    ) -> Result<ImportOutcome> {
        let archive_path = archive_path.as_ref();
        let destination_root = destination_root.as_ref();

        if ArchiveFormat::from_path(archive_path).is_none() {
            return Err(Error::UnsupportedFormat(archive_path.display().to_string()));
        }

        let asset_name = asset_name(archive_path)?;

        fs::create_dir_all(destination_root)?;
        let final_path = unique_destination(destination_root, &asset_name);

        fs::create_dir_all(&self.scratch_root)?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("unrealmgr_import_{}_", asset_name))
            .tempdir_in(&self.scratch_root)?;

        info!(
            "Importing {} into {}",
            archive_path.display(),
            final_path.display()
        );

        let result = self.run_job(archive_path, scratch.path(), &final_path, &asset_name);
        remove_scratch(scratch);

        match &result {
            Ok(ImportOutcome::Imported(path)) => info!("Imported {}", path.display()),
            Ok(ImportOutcome::Cancelled) => info!("Import of {} cancelled", archive_path.display()),
            Err(e) => warn!("Import of {} failed: {}", archive_path.display(), e),
        }

        result
    }

    /// Import into the `Content` folder of an Unreal project, creating it if absent
    pub fn import_into_project<A: AsRef<Path>, P: AsRef<Path>>(
        &self,
        archive_path: A,
        project_dir: P,
    ) -> Result<ImportOutcome> {
        let content_dir = crate::projects::content_dir(project_dir)?;
        self.import(archive_path, content_dir)
    }

    /// Import several archives one after another
    ///
    /// Stops at the first cancellation; archives after it are not attempted.
    pub fn import_all<A: AsRef<Path>, D: AsRef<Path>>(
        &self,
        archives: &[A],
        destination_root: D,
    ) -> Vec<(PathBuf, Result<ImportOutcome>)> {
        let destination_root = destination_root.as_ref();
        let mut results = Vec::with_capacity(archives.len());

        for archive in archives {
            let archive = archive.as_ref();
            if self.cancel.is_cancelled() {
                break;
            }

            let result = self.import(archive, destination_root);
            let cancelled = matches!(result, Ok(ImportOutcome::Cancelled));
            results.push((archive.to_path_buf(), result));

            if cancelled {
                break;
            }
        }

        results
    }

    fn run_job(
        &self,
        archive_path: &Path,
        scratch: &Path,
        final_path: &Path,
        asset_name: &str,
    ) -> Result<ImportOutcome> {
        match extract(archive_path, scratch, self.progress.clone(), &self.cancel)? {
            Extraction::Completed => {}
            Extraction::Cancelled => return Ok(ImportOutcome::Cancelled),
        }

        if self.cancel.is_cancelled() {
            return Ok(ImportOutcome::Cancelled);
        }

        normalize_named(scratch, final_path, asset_name)?;

        if final_path.exists() {
            Ok(ImportOutcome::Imported(final_path.to_path_buf()))
        } else {
            Err(Error::Other(format!(
                "Import finished but {} was not created",
                final_path.display()
            )))
        }
    }
}

/// Collapse wrapper folders in `scratch_dir` and move the result to `destination`
///
/// Folders named like `destination` are treated as asset wrappers.
pub fn normalize<S: AsRef<Path>, D: AsRef<Path>>(scratch_dir: S, destination: D) -> Result<()> {
    let destination = destination.as_ref();
    let asset_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    normalize_named(scratch_dir, destination, &asset_name)
}

/// Like [`normalize`], with an explicit asset name for wrapper detection
///
/// Descends while the current folder holds exactly one child folder with
/// real content, or holds a non-empty folder named `asset_name`; stops after
/// [`MAX_NORMALIZE_DEPTH`] steps. The folder reached is moved to
/// `destination`. If anything goes wrong the raw scratch tree is moved
/// instead so extracted data is never lost.
pub fn normalize_named<S: AsRef<Path>, D: AsRef<Path>>(
    scratch_dir: S,
    destination: D,
    asset_name: &str,
) -> Result<()> {
    let scratch_dir = scratch_dir.as_ref();
    let destination = destination.as_ref();

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let root = match find_content_root(scratch_dir, asset_name) {
        Ok(root) => root,
        Err(e) => {
            warn!(
                "Could not inspect {}: {}, keeping the extracted layout",
                scratch_dir.display(),
                e
            );
            scratch_dir.to_path_buf()
        }
    };

    if root == scratch_dir {
        return move_dir(scratch_dir, destination);
    }

    debug!("Normalized root is {}", root.display());

    if let Err(e) = move_dir(&root, destination) {
        warn!(
            "Failed to move {} to {}: {}, moving the extracted tree unmodified",
            root.display(),
            destination.display(),
            e
        );
        // A failed move never leaves a complete copy behind, only a partial one
        remove_partial(destination)?;
        return move_dir(scratch_dir, destination);
    }

    // Only the emptied wrapper folders remain
    if let Err(e) = fs::remove_dir_all(scratch_dir) {
        warn!("Failed to discard {}: {}", scratch_dir.display(), e);
    }

    Ok(())
}

fn find_content_root(scratch_dir: &Path, asset_name: &str) -> Result<PathBuf> {
    let mut current = scratch_dir.to_path_buf();

    for _ in 0..MAX_NORMALIZE_DEPTH {
        let children = list_children(&current)?;

        let single_wrapper = match children.as_slice() {
            [only] if is_real_dir(only) => {
                if has_meaningful_content(only)? {
                    Some(only.clone())
                } else {
                    None
                }
            }
            _ => None,
        };

        let next = match single_wrapper {
            Some(next) => Some(next),
            None => {
                let mut named = None;
                for child in &children {
                    if child.file_name() == Some(OsStr::new(asset_name))
                        && is_real_dir(child)
                        && !is_empty_dir(child)?
                    {
                        named = Some(child.clone());
                        break;
                    }
                }
                if let Some(ref wrapper) = named {
                    if children.len() > 1 {
                        warn!(
                            "Collapsing wrapper {} drops {} sibling item(s)",
                            wrapper.display(),
                            children.len() - 1
                        );
                    }
                }
                named
            }
        };

        match next {
            Some(next) => {
                debug!("Descending into wrapper {}", next.display());
                current = next;
            }
            None => break,
        }
    }

    Ok(current)
}

fn list_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        children.push(entry?.path());
    }
    children.sort();
    Ok(children)
}

/// A folder is worth descending into when it holds at least one non-empty folder
fn has_meaningful_content(dir: &Path) -> Result<bool> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_real_dir(&path) && !is_empty_dir(&path)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false)
}

/// Move a directory, copying when a rename is not possible (e.g. across drives)
fn move_dir(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(
                "Rename {} -> {} failed ({}), copying instead",
                src.display(),
                dst.display(),
                e
            );
            copy_dir_all(src, dst)?;
            // The copy is complete; a leftover source only costs disk space
            if let Err(e) = fs::remove_dir_all(src) {
                warn!("Failed to remove {} after copying: {}", src.display(), e);
            }
            Ok(())
        }
    }
}

fn remove_partial(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Other(e.to_string()))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn remove_scratch(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    match scratch.close() {
        Ok(()) => debug!("Removed scratch directory {}", path.display()),
        // Moved wholesale into the destination
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove scratch directory {}: {}", path.display(), e),
    }
}

/// Folder name for an imported archive: its file name without extension
pub fn asset_name<P: AsRef<Path>>(archive_path: P) -> Result<String> {
    let archive_path = archive_path.as_ref();
    archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::Other(format!(
                "Cannot derive an asset name from {}",
                archive_path.display()
            ))
        })
}

/// First free path among `root/name`, `root/name_1`, `root/name_2`, …
pub fn unique_destination<P: AsRef<Path>>(root: P, name: &str) -> PathBuf {
    let root = root.as_ref();
    let mut candidate = root.join(name);
    let mut counter = 1;

    while candidate.exists() {
        candidate = root.join(format!("{}_{}", name, counter));
        counter += 1;
    }

    candidate
}
