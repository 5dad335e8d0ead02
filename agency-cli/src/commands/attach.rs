//! `attach`: attach to a run's terminal session interactively.

use agency_core::model::details;
use agency_core::AgencyError;
use agency_tmux::SessionDriver;
use tokio_util::sync::CancellationToken;

use crate::cli::RunArgs;

use super::{cancellable, resolve_for_session};

/// Attach to a run's session. Returns the process exit code (always 0 on
/// success; the interactive handoff itself never returns early unless the
/// multiplexer process fails).
pub async fn run(
    args: &RunArgs,
    driver: &dyn SessionDriver,
    token: &CancellationToken,
) -> Result<i32, AgencyError> {
    let (_ctx, resolved, session) = resolve_for_session(args, token).await?;

    tracing::debug!(%session, "step 5: querying has_session");
    if !cancellable(token, driver.has_session(&session)).await? {
        return Err(AgencyError::SessionNotFound {
            details: details(&[
                ("run_id", &resolved.run_id),
                ("session", &session),
                ("suggestion", &format!("try: resume {}", resolved.run_id)),
            ]),
        });
    }

    tracing::debug!(%session, "step 6: handing off to interactive attach");
    driver.attach(&session).await?;
    Ok(0)
}
