//! Command Protocol. Each command module implements one verb's specific
//! action; the shared resolve-then-log preamble lives here so the step
//! narration stays visible in one place rather than duplicated four
//! times.

pub mod attach;
pub mod kill;
pub mod open;
pub mod stop;

use agency_core::identity::SystemGit;
use agency_core::session_name::session_name;
use agency_core::{resolve, AgencyError, ResolutionContext, ResolvedRun};
use tokio_util::sync::CancellationToken;

use crate::cli::RunArgs;

/// Validate the reference is non-empty, build the resolution context,
/// resolve the run, and derive its session name. Shared by `attach`,
/// `stop`, and `kill` (`open` resolves globally without CWD/explicit
/// scoping per its own description and does not reach a session at all,
/// so it builds its own context).
pub async fn resolve_for_session(
    run: &RunArgs,
    token: &CancellationToken,
) -> Result<(ResolutionContext, ResolvedRun, String), AgencyError> {
    if run.run_ref.trim().is_empty() {
        return Err(AgencyError::usage("a run reference is required"));
    }
    tracing::debug!(run_ref = %run.run_ref, "step 1: validating reference");

    let cwd = std::env::current_dir()?;
    let git = SystemGit;
    tracing::debug!("step 2: building resolution context");
    let ctx = ResolutionContext::build(&git, &cwd, run.repo.as_deref(), token).await?;

    tracing::debug!("step 3: resolving run");
    let resolved = resolve(&ctx, &run.run_ref).await?;

    let session = session_name(&resolved.run_id);
    tracing::debug!(%session, "step 4: derived session name");

    Ok((ctx, resolved, session))
}

/// Race `fut` against `token`, so a controlling SIGINT aborts a
/// multiplexer call promptly instead of leaving the command hung on a
/// misbehaving `tmux` or `git` subprocess.
pub async fn cancellable<T>(
    token: &CancellationToken,
    fut: impl std::future::Future<Output = Result<T, AgencyError>>,
) -> Result<T, AgencyError> {
    tokio::select! {
        result = fut => result,
        _ = token.cancelled() => Err(AgencyError::internal("operation cancelled")),
    }
}
