//! `open`: open a run's worktree in an editor. No session involved at
//! all; this command only needs the resolver and the editor-resolution
//! collaborator (`crate::config`).

use std::path::Path;

use agency_core::model::details;
use agency_core::AgencyError;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::cli::OpenArgs;
use crate::config;

use super::resolve_for_session;

/// Open a run's worktree in an editor. Returns the editor's own exit
/// code on a non-zero exit, propagated through as kind `EInternal`.
pub async fn run(args: &OpenArgs, token: &CancellationToken) -> Result<i32, AgencyError> {
    let (_ctx, resolved, _session) = resolve_for_session(&args.run, token).await?;

    if resolved.broken {
        return Err(AgencyError::RunBroken {
            run_id: resolved.run_id.clone(),
            details: details(&[("repo_id", &resolved.repo_id)]),
        });
    }
    let meta = resolved
        .record
        .meta
        .as_ref()
        .expect("non-broken record always carries meta");

    let worktree_path = Path::new(&meta.worktree_path);
    if !worktree_path.exists() {
        return Err(AgencyError::WorktreeMissing {
            run_id: resolved.run_id.clone(),
            details: details(&[("worktree_path", &meta.worktree_path)]),
        });
    }

    let config = config::load().map_err(AgencyError::internal)?;
    let argv = config::resolve_editor_command(&config, args.editor.as_deref(), worktree_path);
    spawn_editor(&argv).await
}

async fn spawn_editor(argv: &[String]) -> Result<i32, AgencyError> {
    let (program, rest) = argv
        .split_first()
        .ok_or_else(|| AgencyError::internal("empty editor command"))?;

    tracing::debug!(program, "step 6: spawning editor");
    let status = Command::new(program)
        .args(rest)
        .status()
        .await
        .map_err(AgencyError::internal)?;

    if status.success() {
        Ok(0)
    } else {
        let code = status.code().unwrap_or(1);
        tracing::warn!(code, "editor exited non-zero");
        Ok(code)
    }
}
