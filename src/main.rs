//! project-tracker: a console project tracker backed by SQLite
//!
//! Projects carry materials, steps and categories. The interactive menu adds,
//! lists, selects, updates and deletes projects; `list` and `show` print them
//! without prompting.

mod app;
mod cli;
mod data;

use anyhow::{anyhow, Result};
use cli::{AppConfig, Cli};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so they never interleave with menu output
fn init_tracing(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();
    let config = AppConfig::from_cli(cli);
    if let Err(err) = init_tracing(config.debug) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    app::run(config)
}
