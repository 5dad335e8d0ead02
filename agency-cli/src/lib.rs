//! Argument parsing, config loading, and command-protocol orchestration.
//! Split into a library so integration tests can drive the command
//! layer directly, the way `codex-session` keeps `main.rs` a thin
//! `#[tokio::main]` shim over its own `lib.rs`.

pub mod cli;
pub mod commands;
pub mod config;

use agency_core::AgencyError;
use agency_tmux::TmuxDriver;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};

/// Dispatch a parsed [`Cli`] to its command implementation, returning the
/// process exit code on success. `token` is cancelled on a controlling
/// SIGINT (see `main.rs`) so a hung subprocess call — git, tmux, or the
/// editor wait — aborts promptly instead of leaving the process stuck.
pub async fn dispatch(cli: Cli, token: &CancellationToken) -> Result<i32, AgencyError> {
    match cli.command {
        Commands::Attach(args) => {
            let driver = TmuxDriver::locate()?;
            commands::attach::run(&args, &driver, token).await
        }
        Commands::Stop(args) => {
            let driver = TmuxDriver::locate()?;
            commands::stop::run(&args, &driver, token).await
        }
        Commands::Kill(args) => {
            let driver = TmuxDriver::locate()?;
            commands::kill::run(&args, &driver, token).await
        }
        Commands::Open(args) => commands::open::run(&args, token).await,
    }
}

/// Build the `RUST_LOG` default used when the env var is unset.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "agency_core=info,agency_tmux=info,agency_cli=info"
    } else {
        "agency_core=warn,agency_tmux=warn,agency_cli=warn"
    }
}
