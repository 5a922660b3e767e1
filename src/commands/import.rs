use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;
use unrealmgr::{content_dir, ArchiveImporter, CancellationToken, ImportOutcome, ProgressCallback};

/// Create an indicatif-based progress callback for CLI display
fn create_progress_callback() -> ProgressCallback {
    let bar = Arc::new(Mutex::new(ProgressBar::new(0)));
    {
        let b = bar.lock().unwrap();
        b.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=> ")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        b.enable_steady_tick(std::time::Duration::from_millis(80));
    }

    Arc::new(move |msg: &str, current: u64, total: u64| {
        let b = bar.lock().unwrap();
        b.set_length(total);
        b.set_position(current);
        if current >= total && total > 0 {
            b.finish_with_message(msg.to_string());
        } else {
            b.set_message(msg.to_string());
        }
    })
}

/// Ctrl-C cancels the running import; a second Ctrl-C exits immediately
fn cancel_on_interrupt(cancel: &CancellationToken) {
    use signal_hook::consts::SIGINT;
    use signal_hook::flag;

    let registered = flag::register_conditional_shutdown(SIGINT, 130, cancel.shared_flag())
        .and_then(|_| flag::register(SIGINT, cancel.shared_flag()));

    if let Err(e) = registered {
        warn!("Could not install Ctrl-C handler: {}", e);
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn run(archives: Vec<String>, to: Option<String>, project: Option<String>) -> Result<()> {
    let destination = match (to, project) {
        (Some(dir), _) => expand(&dir),
        (None, Some(project)) => content_dir(expand(&project))?,
        (None, None) => bail!("Specify a destination with --to <dir> or --project <dir>"),
    };

    let archives: Vec<PathBuf> = archives.iter().map(|a| expand(a)).collect();

    println!(
        "Importing {} archive{} into {}",
        archives.len(),
        if archives.len() == 1 { "" } else { "s" },
        destination.display()
    );
    println!();

    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel);

    let mut failed = 0;
    let mut cancelled = false;
    for archive in &archives {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| archive.display().to_string());
        println!("📦 {}", name);

        let importer = ArchiveImporter::new()
            .with_cancellation(cancel.clone())
            .with_progress(create_progress_callback());
        match importer.import(archive, &destination) {
            Ok(ImportOutcome::Imported(path)) => {
                println!("  ✓ Imported to {}", path.display());
            }
            Ok(ImportOutcome::Cancelled) => {
                println!("  Import cancelled");
                cancelled = true;
                break;
            }
            Err(e) => {
                println!("  ✗ {}", e);
                failed += 1;
            }
        }
    }

    println!();
    if cancelled {
        bail!("Import cancelled, remaining archives were skipped");
    }
    if failed > 0 {
        bail!("{} of {} import(s) failed", failed, archives.len());
    }

    println!("✓ Done");
    Ok(())
}
