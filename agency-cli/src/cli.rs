//! `clap` surface, in the style of `codex-session::cli`'s `Cli`/`Commands`
//! split.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "agency", about = "Supervise agent runs in isolated worktrees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise the default log level to `info`.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Attach to a run's terminal session, starting interactive control.
    Attach(RunArgs),
    /// Send an interrupt to a run's session and mark it needs-attention.
    Stop(RunArgs),
    /// Kill a run's terminal session outright.
    Kill(RunArgs),
    /// Open a run's worktree in an editor.
    Open(OpenArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// A run name, full id, or unambiguous id prefix.
    pub run_ref: String,

    /// Scope resolution to the repo at this path instead of the CWD repo.
    #[arg(long)]
    pub repo: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct OpenArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Named editor to use, overriding config and `$EDITOR`.
    #[arg(long)]
    pub editor: Option<String>,
}
