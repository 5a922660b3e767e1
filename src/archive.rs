//! Archive extraction into a scratch directory
//!
//! Supports `.zip` (extracted entry by entry, with progress and prompt
//! cancellation) and `.7z` (extracted in one blocking call, either through the
//! `sevenz-rust` library or an external 7-Zip binary).
//!
//! # Examples
//!
//! ```no_run
//! use unrealmgr::archive::{extract, CancellationToken, Extraction};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cancel = CancellationToken::new();
//! match extract("Forest.zip", "/tmp/scratch", None, &cancel)? {
//!     Extraction::Completed => println!("Extracted"),
//!     Extraction::Cancelled => println!("Cancelled"),
//! }
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Progress callback for extraction and import operations
///
/// Called with:
/// - `message`: Description of current operation (e.g., "Extracting Forest.zip")
/// - `current`: Completed units of work
/// - `total`: Total units of work
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// Number of evenly spaced progress reports issued before a blocking 7z extraction
///
/// 7z extraction runs as a single call, so these reports are an approximation
/// of progress rather than a measurement.
pub const SIMULATED_PROGRESS_STEPS: u64 = 5;

/// External 7-Zip executables tried in order
const SEVEN_ZIP_PROGRAMS: &[&str] = &["7z", "7zz", "7za"];

/// Shared cooperative cancellation flag
///
/// Clones observe the same flag. Cancellation is checked between zip entries
/// and between simulated 7z progress steps; a 7z extraction that is already
/// running is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The underlying flag, for hooking up signal handlers
    pub fn shared_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    SevenZip,
}

impl ArchiveFormat {
    /// Detect the format from the file extension (case-insensitive)
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "zip" => Some(Self::Zip),
            "7z" => Some(Self::SevenZip),
            _ => None,
        }
    }
}

/// Check whether a path names an archive that can be imported
pub fn is_supported_archive<P: AsRef<Path>>(path: P) -> bool {
    ArchiveFormat::from_path(path).is_some()
}

/// How an extraction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Completed,
    Cancelled,
}

/// Extract an archive into `scratch_dir`
///
/// Nothing is written outside `scratch_dir`; zip entries whose path would
/// escape it are skipped.
///
/// # Arguments
///
/// * `archive_path` - Path to the .zip or .7z file
/// * `scratch_dir` - Directory receiving the extracted tree (created if missing)
/// * `progress` - Optional callback for progress updates
/// * `cancel` - Cancellation flag polled between extraction steps
pub fn extract<A: AsRef<Path>, S: AsRef<Path>>(
    archive_path: A,
    scratch_dir: S,
    progress: Option<ProgressCallback>,
    cancel: &CancellationToken,
) -> Result<Extraction> {
    let archive_path = archive_path.as_ref();
    let scratch_dir = scratch_dir.as_ref();

    let format = ArchiveFormat::from_path(archive_path)
        .ok_or_else(|| Error::UnsupportedFormat(archive_path.display().to_string()))?;

    if !archive_path.is_file() {
        return Err(Error::Other(format!(
            "Archive not found: {}",
            archive_path.display()
        )));
    }

    fs::create_dir_all(scratch_dir)?;

    info!(
        "Extracting {} into {}",
        archive_path.display(),
        scratch_dir.display()
    );

    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, scratch_dir, progress, cancel),
        ArchiveFormat::SevenZip => extract_7z(archive_path, scratch_dir, progress, cancel),
    }
}

fn extract_zip(
    archive_path: &Path,
    scratch_dir: &Path,
    progress: Option<ProgressCallback>,
    cancel: &CancellationToken,
) -> Result<Extraction> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let total = archive.len() as u64;
    let message = format!("Extracting {}", display_name(archive_path));

    for i in 0..archive.len() {
        if cancel.is_cancelled() {
            info!("Extraction of {} cancelled", archive_path.display());
            return Ok(Extraction::Cancelled);
        }

        let mut entry = archive.by_index(i)?;

        match entry.enclosed_name() {
            Some(relative) => {
                let out_path = scratch_dir.join(relative);

                if entry.is_dir() {
                    fs::create_dir_all(&out_path)?;
                } else {
                    if let Some(parent) = out_path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    let mut out_file = File::create(&out_path)?;
                    io::copy(&mut entry, &mut out_file)?;

                    #[cfg(unix)]
                    {
                        use std::os::unix::fs::PermissionsExt;
                        if let Some(mode) = entry.unix_mode() {
                            let perms = fs::Permissions::from_mode(mode);
                            if let Err(e) = fs::set_permissions(&out_path, perms) {
                                debug!(
                                    "Could not apply mode {:o} to {}: {}",
                                    mode,
                                    out_path.display(),
                                    e
                                );
                            }
                        }
                    }
                }
            }
            None => warn!("Skipping zip entry outside the archive root: {}", entry.name()),
        }

        if let Some(ref cb) = progress {
            cb(&message, i as u64 + 1, total);
        }
    }

    Ok(Extraction::Completed)
}

fn extract_7z(
    archive_path: &Path,
    scratch_dir: &Path,
    progress: Option<ProgressCallback>,
    cancel: &CancellationToken,
) -> Result<Extraction> {
    let message = format!("Extracting {}", display_name(archive_path));

    for step in 0..SIMULATED_PROGRESS_STEPS {
        if cancel.is_cancelled() {
            info!("Extraction of {} cancelled", archive_path.display());
            return Ok(Extraction::Cancelled);
        }
        if let Some(ref cb) = progress {
            cb(&message, step, SIMULATED_PROGRESS_STEPS);
        }
    }

    if let Err(e) = extract_7z_with_library(archive_path, scratch_dir) {
        warn!(
            "7z library could not extract {}: {}, trying external 7-Zip",
            archive_path.display(),
            e
        );

        // Discard whatever the library left behind before the second attempt
        fs::remove_dir_all(scratch_dir)?;
        fs::create_dir_all(scratch_dir)?;

        extract_7z_with_command(archive_path, scratch_dir)?;
    }

    if let Some(ref cb) = progress {
        cb(&message, SIMULATED_PROGRESS_STEPS, SIMULATED_PROGRESS_STEPS);
    }

    Ok(Extraction::Completed)
}

#[cfg(feature = "sevenz")]
fn extract_7z_with_library(archive_path: &Path, scratch_dir: &Path) -> Result<()> {
    sevenz_rust::decompress_file(archive_path, scratch_dir)?;
    Ok(())
}

#[cfg(not(feature = "sevenz"))]
fn extract_7z_with_library(_archive_path: &Path, _scratch_dir: &Path) -> Result<()> {
    Err(Error::Other(
        "built without the `sevenz` feature".to_string(),
    ))
}

fn extract_7z_with_command(archive_path: &Path, scratch_dir: &Path) -> Result<()> {
    for program in SEVEN_ZIP_PROGRAMS {
        let output = Command::new(program)
            .arg("x")
            .arg("-y")
            .arg(format!("-o{}", scratch_dir.display()))
            .arg(archive_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                debug!("Extracted {} with {}", archive_path.display(), program);
                return Ok(());
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(Error::ExtractorFailed(format!(
                    "{} exited with {}: {}",
                    program,
                    output.status,
                    stderr.trim()
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} not found on PATH", program);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::MissingExtractor)
}

/// Find every supported archive below `folder`, sorted by path
pub fn find_archive_files<P: AsRef<Path>>(folder: P) -> Vec<PathBuf> {
    let mut archives: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported_archive(e.path()))
        .map(|e| e.into_path())
        .collect();

    archives.sort();
    archives
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn create_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, content) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ArchiveFormat::from_path("a/Forest.zip"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path("Forest.ZIP"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_path("Forest.7z"), Some(ArchiveFormat::SevenZip));
        assert_eq!(ArchiveFormat::from_path("Forest.rar"), None);
        assert_eq!(ArchiveFormat::from_path("Forest"), None);
        assert!(!is_supported_archive("Forest.tar.gz"));
    }

    #[test]
    fn test_extract_zip_with_progress() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("Forest.zip");
        create_zip(
            &archive,
            &[
                ("Forest/Maps/Level1.umap", "map"),
                ("Forest/Textures/Bark.png", "png"),
                ("Forest/README.md", "readme"),
            ],
        );
        let scratch = temp_dir.path().join("scratch");

        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_clone = calls.clone();
        let progress: ProgressCallback = Arc::new(move |_msg, current, total| {
            calls_clone.lock().unwrap().push((current, total));
        });

        let result = extract(&archive, &scratch, Some(progress), &CancellationToken::new());
        assert_eq!(result.unwrap(), Extraction::Completed);

        assert_eq!(
            fs::read_to_string(scratch.join("Forest/Maps/Level1.umap")).unwrap(),
            "map"
        );
        assert!(scratch.join("Forest/README.md").is_file());
        assert_eq!(*calls.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_extract_zip_cancelled() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("Forest.zip");
        create_zip(&archive, &[("a.txt", "a"), ("b.txt", "b")]);
        let scratch = temp_dir.path().join("scratch");

        let cancel = CancellationToken::new();
        let cancel_from_callback = cancel.clone();
        let progress: ProgressCallback = Arc::new(move |_msg, _current, _total| {
            cancel_from_callback.cancel();
        });

        let result = extract(&archive, &scratch, Some(progress), &cancel);
        assert_eq!(result.unwrap(), Extraction::Cancelled);
        assert!(scratch.join("a.txt").exists());
        assert!(!scratch.join("b.txt").exists(), "second entry must not be extracted");
    }

    #[test]
    fn test_cancellation_through_shared_flag() {
        let cancel = CancellationToken::new();
        let flag = cancel.shared_flag();
        assert!(!cancel.is_cancelled());

        // What a signal handler does
        flag.store(true, Ordering::SeqCst);

        assert!(cancel.is_cancelled());
        assert!(cancel.clone().is_cancelled());
    }

    #[test]
    fn test_extract_zip_skips_escaping_entries() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("Evil.zip");
        create_zip(&archive, &[("../escaped.txt", "x"), ("safe.txt", "ok")]);
        let scratch = temp_dir.path().join("scratch");

        let result = extract(&archive, &scratch, None, &CancellationToken::new());
        assert!(result.is_ok());
        assert!(scratch.join("safe.txt").exists());
        assert!(!temp_dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn test_extract_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("Forest.rar");
        fs::write(&archive, b"not really").unwrap();
        let scratch = temp_dir.path().join("scratch");

        let result = extract(&archive, &scratch, None, &CancellationToken::new());
        let err = result.unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(err.to_string().contains("Unsupported archive format"));
        assert!(!scratch.exists(), "nothing should be written for unsupported input");
    }

    #[test]
    fn test_extract_missing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let result = extract(
            temp_dir.path().join("Missing.zip"),
            temp_dir.path().join("scratch"),
            None,
            &CancellationToken::new(),
        );
        assert!(result.unwrap_err().to_string().contains("Archive not found"));
    }

    #[test]
    fn test_extract_corrupt_zip_fails() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("Broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();

        let result = extract(
            &archive,
            temp_dir.path().join("scratch"),
            None,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(Error::Zip(_))));
    }

    #[test]
    fn test_extract_corrupt_7z_fails() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("Broken.7z");
        fs::write(&archive, b"definitely not a 7z archive").unwrap();

        let result = extract(
            &archive,
            temp_dir.path().join("scratch"),
            None,
            &CancellationToken::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_7z_cancelled_before_extraction() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("Forest.7z");
        fs::write(&archive, b"never read").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = extract(&archive, temp_dir.path().join("scratch"), None, &cancel);
        assert_eq!(result.unwrap(), Extraction::Cancelled);
    }

    #[test]
    fn test_find_archive_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("nested/deeper")).unwrap();
        fs::write(root.join("a.zip"), b"").unwrap();
        fs::write(root.join("nested/B.ZIP"), b"").unwrap();
        fs::write(root.join("nested/deeper/c.7z"), b"").unwrap();
        fs::write(root.join("nested/notes.txt"), b"").unwrap();
        fs::create_dir_all(root.join("folder.zip")).unwrap();

        let found = find_archive_files(root);
        assert_eq!(
            found,
            vec![
                root.join("a.zip"),
                root.join("nested/B.ZIP"),
                root.join("nested/deeper/c.7z"),
            ]
        );
    }
}
