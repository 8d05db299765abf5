//! `cfb` - watch, scan, and manage monitored folders from the terminal.

use std::path::PathBuf;

use anyhow::Result;
use cfb_gallery::SettingsStore;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod cmd;

/// Creative File Browser core tools
#[derive(Debug, Parser)]
#[command(name = "cfb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings document (default: platform config directory)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Watch folders and summarize the catalog after every change
    Watch {
        /// Folder to watch instead of the monitored folders (repeatable)
        #[arg(long = "folder", value_name = "DIR")]
        folders: Vec<PathBuf>,

        /// Override the configured quiet period in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Print the media found under directories
    Scan {
        /// Directories to scan (default: the monitored folders)
        #[arg(value_name = "DIR")]
        dirs: Vec<PathBuf>,

        /// Maximum depth below each directory
        #[arg(long)]
        max_depth: Option<usize>,

        /// Fail on the first unreadable entry instead of skipping it
        #[arg(long)]
        strict: bool,
    },
    /// Explain whether paths would be excluded from enumeration
    Check {
        /// Paths to test
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Entry name to test instead of the last path component
        #[arg(long)]
        name: Option<String>,
    },
    /// Manage monitored folders
    #[command(subcommand)]
    Folders(FoldersCommand),
    /// Manage saved workspaces
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
}

#[derive(Debug, Subcommand)]
pub enum FoldersCommand {
    /// List monitored folders
    List,
    /// Start monitoring a folder
    Add {
        /// Folder to add
        path: PathBuf,
    },
    /// Stop monitoring a folder
    Remove {
        /// Folder to remove
        path: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum WorkspaceCommand {
    /// List saved workspaces
    List,
    /// Save the monitored folders as a workspace
    Save {
        /// Workspace name
        name: String,
    },
    /// Replace the monitored folders with a saved workspace
    Load {
        /// Workspace name
        name: String,
    },
}

/// Log to stderr. `RUST_LOG` takes precedence over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve the settings store from the command line.
pub fn settings_store(path: Option<PathBuf>) -> Result<SettingsStore> {
    match path {
        Some(path) => Ok(SettingsStore::new(path)),
        None => Ok(SettingsStore::default_location()?),
    }
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let store = settings_store(cli.settings)?;

    match cli.command {
        Commands::Watch {
            folders,
            debounce_ms,
        } => cmd::watch::run(store, folders, debounce_ms).await,
        Commands::Scan {
            dirs,
            max_depth,
            strict,
        } => cmd::scan::run(&store, &dirs, max_depth, strict),
        Commands::Check { paths, name } => cmd::check::run(&store, &paths, name.as_deref()),
        Commands::Folders(command) => cmd::folders::run(&store, command),
        Commands::Workspace(command) => cmd::workspace::run(&store, command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cfb",
            "folders",
            "add",
            "/data/photos",
            "--settings",
            "/tmp/s.json",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.json")));
        assert!(matches!(
            cli.command,
            Commands::Folders(FoldersCommand::Add { ref path }) if path == &PathBuf::from("/data/photos")
        ));
    }

    #[test]
    fn test_check_requires_paths() {
        assert!(Cli::try_parse_from(["cfb", "check"]).is_err());

        let cli = Cli::try_parse_from(["cfb", "check", "/x", "--name", "Thumbs.db"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Check { ref name, .. } if name.as_deref() == Some("Thumbs.db")
        ));
    }

    #[test]
    fn test_watch_flags() {
        let cli = Cli::try_parse_from([
            "cfb",
            "watch",
            "--folder",
            "/a",
            "--folder",
            "/b",
            "--debounce-ms",
            "250",
        ])
        .unwrap();

        let Commands::Watch {
            folders,
            debounce_ms,
        } = cli.command
        else {
            panic!("expected watch");
        };
        assert_eq!(folders, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(debounce_ms, Some(250));
    }

    #[test]
    fn test_scan_flags() {
        let cli = Cli::try_parse_from(["cfb", "scan", "/a", "--max-depth", "2", "--strict"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Scan {
                max_depth: Some(2),
                strict: true,
                ..
            }
        ));
    }
}
