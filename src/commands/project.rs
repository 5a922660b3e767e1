use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use unrealmgr::{config, project_info, ProjectEntry, ProjectManager, UProject};

pub fn run(action: &crate::ProjectAction) -> Result<()> {
    use crate::ProjectAction;

    match action {
        ProjectAction::Info { path } => info(path),
        ProjectAction::Recent => recent(),
        ProjectAction::Remember { path } => remember(path),
    }
}

/// Accept either a .uproject file or the folder containing one
fn resolve_uproject(path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(shellexpand::tilde(path).as_ref());
    if path.is_dir() {
        return Ok(UProject::find(&path)?);
    }
    if !path.is_file() {
        bail!("Project not found: {}", path.display());
    }
    Ok(path)
}

fn info(path: &str) -> Result<()> {
    let uproject = resolve_uproject(path)?;
    let info = project_info(&uproject)
        .with_context(|| format!("Could not read project file {}", uproject.display()))?;

    let name = UProject::name(&uproject).unwrap_or_default();
    println!("{}", name);
    println!("  File:        {}", uproject.display());
    println!("  Engine:      {}", info.engine_version);
    print_optional("Description", &info.description);
    print_optional("Category", &info.category);
    print_optional("Company", &info.company);
    print_optional("Homepage", &info.homepage);
    println!("  Modules:     {}", info.modules);
    println!("  Plugins:     {}", info.plugins);

    Ok(())
}

fn print_optional(label: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<12} {}", format!("{}:", label), value);
    }
}

fn recent() -> Result<()> {
    let config_dir = config::ensure_config_dir()?;
    let mut manager = ProjectManager::open(&config_dir);
    let projects = manager.recent_projects();

    if projects.is_empty() {
        println!("No recent projects.");
        println!();
        println!("Remember one with: unrealmgr project remember <path>");
        return Ok(());
    }

    for project in projects {
        println!("  {}", project.name);
        println!("      {}", project.path.display());
        if let Some(opened) = &project.last_opened {
            println!("      last opened {}", opened);
        }
    }
    Ok(())
}

fn remember(path: &str) -> Result<()> {
    let uproject = resolve_uproject(path)?;
    let uproject = absolute(&uproject);

    let config_dir = config::ensure_config_dir()?;
    let mut manager = ProjectManager::open(&config_dir);
    let entry = ProjectEntry::from_uproject(&uproject)?;
    let name = entry.name.clone();

    if !manager.add_recent(entry) {
        bail!("Failed to save the recent project list");
    }

    println!("✓ Remembered {}", name);
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
