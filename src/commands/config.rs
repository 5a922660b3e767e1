use anyhow::Result;
use unrealmgr::config::{self, LIBRARY_FILE, PROJECTS_FILE};
use unrealmgr::AssetLibrary;

pub fn run(action: &crate::ConfigAction) -> Result<()> {
    use crate::ConfigAction;

    match action {
        ConfigAction::Path => {
            println!("{}", config::config_dir()?.display());
            Ok(())
        }
        ConfigAction::Show => show_config(),
    }
}

fn show_config() -> Result<()> {
    let config_dir = config::ensure_config_dir()?;
    let library = AssetLibrary::open(&config_dir);
    let settings = library.settings();

    println!();
    println!("  📁 Config directory: {}", config_dir.display());
    println!("     Asset library:    {}", config_dir.join(LIBRARY_FILE).display());
    println!("     Recent projects:  {}", config_dir.join(PROJECTS_FILE).display());
    println!();

    println!("┌─ Library Settings ───────────────────────────────┐");
    println!("  Auto refresh:      {}", format_bool(settings.auto_refresh));
    println!("  Show preview:      {}", format_bool(settings.show_preview));
    println!("  Max recent files:  {}", settings.max_recent_files);
    println!("└──────────────────────────────────────────────────┘");
    println!();

    println!(
        "  {} asset{} in {} categor{}",
        library.resources().len(),
        if library.resources().len() == 1 { "" } else { "s" },
        library.categories().len() - 1,
        if library.categories().len() == 2 { "y" } else { "ies" }
    );
    println!();

    Ok(())
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "✓ enabled"
    } else {
        "✗ disabled"
    }
}
