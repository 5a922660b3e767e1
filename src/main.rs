use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

mod commands;

/// unrealmgr - Asset and project manager for Unreal Engine
#[derive(Parser)]
#[command(name = "unrealmgr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import asset archives (.zip, .7z)
    Import {
        /// Archives to import
        #[arg(required = true)]
        archives: Vec<String>,

        /// Folder to import into
        #[arg(long, conflicts_with = "project", required_unless_present = "project")]
        to: Option<String>,

        /// Unreal project to import into (its Content folder)
        #[arg(long)]
        project: Option<String>,
    },

    /// List importable archives in a folder (recursive)
    FindArchives {
        /// Folder to search
        folder: String,
    },

    /// Manage the local asset library
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Inspect and remember Unreal projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum LibraryAction {
    /// List assets
    List {
        /// Only show assets in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Filter by name or category (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Add an asset folder to the library
    Add {
        /// Display name
        name: String,
        /// Asset folder
        path: String,

        /// Category (defaults to "Default")
        #[arg(short, long)]
        category: Option<String>,

        /// Cover image
        #[arg(long)]
        cover: Option<String>,

        /// Create a README.md stub in the asset folder
        #[arg(long)]
        readme: bool,
    },

    /// Remove an asset from the library (files are kept)
    Remove {
        /// Index as shown by `library list`
        index: usize,
    },

    /// List categories
    Categories,

    /// Create a category
    AddCategory {
        name: String,
    },

    /// Delete an empty category
    RemoveCategory {
        name: String,
    },

    /// Link a folder to a category
    AddPath {
        category: String,
        path: String,
    },

    /// Unlink a folder from a category
    RemovePath {
        category: String,
        path: String,
    },

    /// Show folders in a category's linked paths that aren't in the library yet
    Scan {
        category: String,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Show details of a project (.uproject file or project folder)
    Info {
        path: String,
    },

    /// List recently used projects
    Recent,

    /// Add a project to the recent list
    Remember {
        path: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config directory
    Path,

    /// Show config files and library settings
    Show,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Import {
            archives,
            to,
            project,
        } => commands::import::run(archives, to, project),
        Commands::FindArchives { folder } => commands::find_archives::run(folder),
        Commands::Library { action } => commands::library::run(&action),
        Commands::Project { action } => commands::project::run(&action),
        Commands::Config { action } => commands::config::run(&action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "unrealmgr", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
