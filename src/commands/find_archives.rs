use anyhow::{bail, Result};
use std::path::PathBuf;
use unrealmgr::find_archive_files;

pub fn run(folder: String) -> Result<()> {
    let folder = PathBuf::from(shellexpand::tilde(&folder).as_ref());
    if !folder.is_dir() {
        bail!("Folder not found: {}", folder.display());
    }

    let archives = find_archive_files(&folder);
    if archives.is_empty() {
        println!("No .zip or .7z archives found in {}", folder.display());
        return Ok(());
    }

    for archive in &archives {
        println!("{}", archive.display());
    }
    println!();
    println!(
        "Found {} archive{}",
        archives.len(),
        if archives.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
