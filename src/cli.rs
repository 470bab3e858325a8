//! Command-line interface argument parsing for project-tracker.
//!
//! - `project-tracker` or `project-tracker menu`: interactive menu
//! - `project-tracker list --json`: print every project
//! - `project-tracker show 3`: print one project with its materials, steps and categories

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "PROJECT_TRACKER_DB";

/// A console project tracker backed by SQLite.
#[derive(Parser, Debug)]
#[command(name = "project-tracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the SQLite database file
    /// Defaults to <data dir>/project-tracker/projects.db
    #[arg(long, global = true, env = DB_PATH_ENV)]
    pub db_path: Option<PathBuf>,

    /// How long to wait for a locked database before failing, in milliseconds
    #[arg(long, global = true, default_value = "5000")]
    pub busy_timeout_ms: u64,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the interactive menu (default)
    Menu,

    /// List all projects sorted by name
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show one project with its materials, steps and categories
    Show {
        /// Project ID
        id: i64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub command: Commands,
    pub db_path: PathBuf,
    pub busy_timeout: Duration,
    pub debug: bool,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Self {
        // Default to <data dir>/project-tracker/projects.db
        let db_path = cli.db_path.unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("project-tracker")
                .join("projects.db")
        });

        AppConfig {
            command: cli.command.unwrap_or(Commands::Menu),
            db_path,
            busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
            debug: cli.debug,
        }
    }
}
