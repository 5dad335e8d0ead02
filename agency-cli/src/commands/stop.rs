//! `stop`: send an interrupt to a run's session and mark it needs-attention.

use agency_core::model::Event;
use agency_core::AgencyError;
use agency_tmux::SessionDriver;
use tokio_util::sync::CancellationToken;

use crate::cli::RunArgs;

use super::{cancellable, resolve_for_session};

const STOP_KEYS: [&str; 1] = ["C-c"];

/// Send an interrupt to a run's session and mark it needs-attention. A
/// missing session is a no-op, not an error.
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

    tracing::debug!(%session, "step 6: send_keys(C-c)");
    cancellable(token, driver.send_keys(&session, &STOP_KEYS)).await?;

    agency_core::store::set_needs_attention(&ctx.data_dir, &resolved.repo_id, &resolved.run_id, true)
        .await?;

    tracing::debug!("step 7: appending stop event");
    agency_core::store::append_event(
        &ctx.data_dir,
        &resolved.repo_id,
        &resolved.run_id,
        &Event::stop(&resolved.repo_id, &resolved.run_id, &STOP_KEYS),
    )
    .await?;

    Ok(0)
}
