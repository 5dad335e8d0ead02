//! Typed error taxonomy shared by every component.
//!
//! Every fallible operation in this crate returns `Result<T, AgencyError>`.
//! Wrapping is additive: an inner cause is kept for diagnostics (`source`)
//! but never changes the surfaced `code()`, matching the propagation rule
//! in the error-handling design.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::RunRecord;

/// One entry of the error taxonomy. The string returned by `code()` is
/// user-visible and must stay stable across releases.
#[derive(thiserror::Error, Debug)]
pub enum AgencyError {
    #[error("{message}")]
    Usage { message: String },

    #[error("invalid --repo path: {message}")]
    InvalidRepoPath {
        message: String,
        details: BTreeMap<String, String>,
    },

    #[error("{message}")]
    RunNotFound { message: String },

    #[error("run id is ambiguous")]
    RunIdAmbiguous { details: BTreeMap<String, String> },

    #[error("run reference is ambiguous")]
    RunRefAmbiguous { details: BTreeMap<String, String> },

    #[error("run is broken: {run_id}")]
    RunBroken {
        run_id: String,
        details: BTreeMap<String, String>,
    },

    #[error("worktree missing for run {run_id}")]
    WorktreeMissing {
        run_id: String,
        details: BTreeMap<String, String>,
    },

    #[error("session not found")]
    SessionNotFound { details: BTreeMap<String, String> },

    #[error("tmux is not installed or not reachable")]
    TmuxNotInstalled { source: Option<String> },

    #[error("tmux operation failed: {message}")]
    TmuxFailed { message: String },

    #[error("failed to persist run state: {message}")]
    PersistFailed { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AgencyError {
    /// The stable, user-visible string code from the error taxonomy table.
    pub fn code(&self) -> &'static str {
        match self {
            AgencyError::Usage { .. } => "EUsage",
            AgencyError::InvalidRepoPath { .. } => "EInvalidRepoPath",
            AgencyError::RunNotFound { .. } => "ERunNotFound",
            AgencyError::RunIdAmbiguous { .. } => "ERunIDAmbiguous",
            AgencyError::RunRefAmbiguous { .. } => "ERunRefAmbiguous",
            AgencyError::RunBroken { .. } => "ERunBroken",
            AgencyError::WorktreeMissing { .. } => "EWorktreeMissing",
            AgencyError::SessionNotFound { .. } => "ESessionNotFound",
            AgencyError::TmuxNotInstalled { .. } => "ETmuxNotInstalled",
            AgencyError::TmuxFailed { .. } => "ETmuxFailed",
            AgencyError::PersistFailed { .. } => "EPersistFailed",
            AgencyError::Internal { .. } => "EInternal",
        }
    }

    /// Best-effort key/value details attached to the error, if any.
    pub fn details(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            AgencyError::InvalidRepoPath { details, .. }
            | AgencyError::RunIdAmbiguous { details }
            | AgencyError::RunRefAmbiguous { details }
            | AgencyError::RunBroken { details, .. }
            | AgencyError::WorktreeMissing { details, .. }
            | AgencyError::SessionNotFound { details } => Some(details),
            _ => None,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        AgencyError::Usage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl fmt::Display) -> Self {
        AgencyError::Internal {
            message: message.to_string(),
        }
    }

    pub fn persist_failed(message: impl fmt::Display) -> Self {
        AgencyError::PersistFailed {
            message: message.to_string(),
        }
    }
}

impl From<std::io::Error> for AgencyError {
    fn from(err: std::io::Error) -> Self {
        AgencyError::internal(err)
    }
}

/// Render the ambiguity candidate list the way every ambiguous error
/// surfaces it: one `run_id (name) in repo <repo_id>` line per candidate,
/// followed by a hint. Shared by the id-ambiguous and ref-ambiguous paths
/// so formatting never drifts between the two call sites.
pub fn format_candidates(candidates: &[RunRecord]) -> String {
    let mut lines: Vec<String> = candidates
        .iter()
        .map(|r| {
            let name = r.name.as_deref().unwrap_or("-");
            format!("{} ({}) in repo {}", r.run_id, name, r.repo_id)
        })
        .collect();
    lines.push("hint: use the full run id, or pass --repo to narrow the scope".to_string());
    lines.join("\n")
}
