//! `kill`: kill a run's terminal session outright.

use agency_core::model::Event;
use agency_core::AgencyError;
use agency_tmux::SessionDriver;
use tokio_util::sync::CancellationToken;

use crate::cli::RunArgs;

use super::{cancellable, resolve_for_session};

/// Kill a run's session outright. A missing session is a no-op, not an
/// error.
pub async fn run(
    args: &RunArgs,
    driver: &dyn SessionDriver,
    token: &CancellationToken,
) -> Result<i32, AgencyError> {
    let (ctx, resolved, session) = resolve_for_session(args, token).await?;

    tracing::debug!(%session, "step 5: querying has_session");
    if !cancellable(token, driver.has_session(&session)).await? {
        eprintln!("no session for {}", resolved.run_id);
        return Ok(0);
    }

    tracing::debug!(%session, "step 6: kill_session");
    cancellable(token, driver.kill_session(&session)).await?;

    tracing::debug!("step 7: appending kill_session event");
    agency_core::store::append_event(
        &ctx.data_dir,
        &resolved.repo_id,
        &resolved.run_id,
        &Event::kill_session(&resolved.repo_id, &resolved.run_id, &session),
    )
    .await?;

    Ok(0)
}
