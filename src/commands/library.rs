use anyhow::{bail, Result};
use std::path::PathBuf;
use unrealmgr::library::{ALL_CATEGORY, DEFAULT_CATEGORY};
use unrealmgr::{config, AssetLibrary};

pub fn run(action: &crate::LibraryAction) -> Result<()> {
    use crate::LibraryAction;

    let config_dir = config::ensure_config_dir()?;
    let mut library = AssetLibrary::open(&config_dir);

    match action {
        LibraryAction::List { category, search } => list(
            &library,
            category.as_deref().unwrap_or(ALL_CATEGORY),
            search.as_deref().unwrap_or(""),
        ),
        LibraryAction::Add {
            name,
            path,
            category,
            cover,
            readme,
        } => add(
            &mut library,
            name,
            path,
            category.as_deref().unwrap_or(DEFAULT_CATEGORY),
            cover.as_deref(),
            *readme,
        ),
        LibraryAction::Remove { index } => {
            let removed = library.remove_resource(*index)?;
            println!("✓ Removed {} from the library (files kept)", removed.name);
            Ok(())
        }
        LibraryAction::Categories => categories(&library),
        LibraryAction::AddCategory { name } => {
            if !library.add_category(name) {
                bail!("Category '{}' is empty or already exists", name.trim());
            }
            println!("✓ Added category {}", name.trim());
            Ok(())
        }
        LibraryAction::RemoveCategory { name } => {
            if !library.remove_category(name)? {
                bail!("Category '{}' not found", name);
            }
            println!("✓ Removed category {}", name);
            Ok(())
        }
        LibraryAction::AddPath { category, path } => add_path(&mut library, category, path),
        LibraryAction::RemovePath { category, path } => {
            let path = absolute(path);
            if !library.remove_category_path(category, &path) {
                bail!("{} is not linked to category '{}'", path, category);
            }
            println!("✓ Unlinked {} from {}", path, category);
            Ok(())
        }
        LibraryAction::Scan { category } => scan(&library, category),
    }
}

/// Expand `~` and make relative paths absolute so stored paths stay stable
fn absolute(path: &str) -> String {
    let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    };
    absolute.to_string_lossy().to_string()
}

fn ensure_category(library: &AssetLibrary, category: &str) -> Result<()> {
    if category == ALL_CATEGORY || !library.categories().iter().any(|c| c == category) {
        bail!(
            "Unknown category '{}'\n\nCreate it first with: unrealmgr library add-category \"{}\"",
            category,
            category
        );
    }
    Ok(())
}

fn list(library: &AssetLibrary, category: &str, search: &str) -> Result<()> {
    let indexed: Vec<_> = library
        .filtered(category, search)
        .into_iter()
        .filter_map(|asset| {
            library
                .resources()
                .iter()
                .position(|r| std::ptr::eq(r, asset))
                .map(|i| (i, asset))
        })
        .collect();

    if indexed.is_empty() {
        println!("No assets found.");
        println!();
        println!("Add assets with: unrealmgr library add <name> <path>");
        return Ok(());
    }

    for (index, asset) in &indexed {
        println!("  [{}] {} ({})", index, asset.name, asset.category);
        println!("      {}", asset.path);
        if !asset.date_added.is_empty() {
            println!("      added {}", asset.date_added);
        }
    }

    println!();
    println!(
        "Total: {} asset{}",
        indexed.len(),
        if indexed.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

fn add(
    library: &mut AssetLibrary,
    name: &str,
    path: &str,
    category: &str,
    cover: Option<&str>,
    readme: bool,
) -> Result<()> {
    ensure_category(library, category)?;

    let path = absolute(path);
    if !PathBuf::from(&path).is_dir() {
        bail!("Asset folder not found: {}", path);
    }
    let cover = cover.map(absolute).unwrap_or_default();

    if !library.add_resource(name, &path, category, &cover, readme) {
        bail!(
            "Failed to save the asset library to {}",
            library.config_path().display()
        );
    }

    println!("✓ Added {} to {}", name, category);
    Ok(())
}

fn categories(library: &AssetLibrary) -> Result<()> {
    for category in library.categories() {
        let count = library.filtered(category, "").len();
        println!("  {} ({})", category, count);
        for path in library.category_paths(category) {
            println!("      📁 {}", path);
        }
    }
    Ok(())
}

fn add_path(library: &mut AssetLibrary, category: &str, path: &str) -> Result<()> {
    ensure_category(library, category)?;

    let path = absolute(path);
    if !PathBuf::from(&path).is_dir() {
        bail!("Folder not found: {}", path);
    }
    if library.is_path_conflict(category, &path) {
        bail!("{} is already linked to another category", path);
    }
    if !library.add_category_path(category, &path) {
        bail!("{} is already linked to category '{}'", path, category);
    }

    println!("✓ Linked {} to {}", path, category);
    Ok(())
}

fn scan(library: &AssetLibrary, category: &str) -> Result<()> {
    ensure_category(library, category)?;

    let folders = library.untracked_folders(category);
    if folders.is_empty() {
        println!("No new folders in the paths linked to {}.", category);
        return Ok(());
    }

    println!("New folders in {}:", category);
    for folder in &folders {
        println!("  {}  ({})", folder.name, folder.path);
    }
    println!();
    println!("Add one with: unrealmgr library add <name> <path> --category \"{}\"", category);
    Ok(())
}
