//! Repo identity derivation.
//!
//! Grounded on `code-core::git_worktree::get_git_root_from` (shell out to
//! `git rev-parse --show-toplevel`, treat a non-zero exit as "not a
//! repo"); `config --get remote.origin.url` may fail, which we treat as
//! an empty origin rather than an error.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::process::Command;

/// Derive a stable `repo_id` from a repo root plus an optional origin URL.
///
/// Pure and deterministic: same inputs always produce the same id. When
/// `origin_url` is non-empty the id is keyed purely off the URL, so every
/// clone of the same remote resolves to the same `repo_id` regardless of
/// local path. When it is empty the id is keyed off the canonicalized
/// local path, which is stable across invocations on one machine but
/// intentionally distinct from any other checkout's id.
pub fn derive_repo_identity(repo_root: &Path, origin_url: &str) -> String {
    let trimmed = origin_url.trim();
    let mut hasher = Sha256::new();
    if trimmed.is_empty() {
        hasher.update(b"local:");
        hasher.update(repo_root.to_string_lossy().as_bytes());
    } else {
        hasher.update(b"origin:");
        hasher.update(trimmed.as_bytes());
    }
    let digest = hasher.finalize();
    // 16 hex chars (64 bits) is ample collision resistance for a
    // human-typed, prefix-matchable identifier and keeps directory names
    // short.
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut out = String::with_capacity(chars);
    for byte in bytes {
        if out.len() >= chars {
            break;
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out.truncate(chars);
    out
}

/// The external git collaborator contract: derives a repo root and,
/// best-effort, its origin URL.
#[async_trait::async_trait]
pub trait GitCollaborator: Send + Sync {
    /// Resolve the repo root for `path`. Fails when `path` is not inside
    /// a git repository.
    async fn get_repo_root(&self, path: &Path) -> std::io::Result<PathBuf>;

    /// Resolve the configured origin URL for `path`. Never fails; returns
    /// an empty string when no remote is configured.
    async fn get_origin_info(&self, path: &Path) -> String;
}

/// Shells out to the real `git` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

#[async_trait::async_trait]
impl GitCollaborator for SystemGit {
    async fn get_repo_root(&self, path: &Path) -> std::io::Result<PathBuf> {
        tracing::debug!(path = %path.display(), "git rev-parse --show-toplevel");
        let output = Command::new("git")
            .arg("rev-parse")
            .arg("--show-toplevel")
            .current_dir(path)
            .output()
            .await?;

        if !output.status.success() {
            tracing::debug!(path = %path.display(), "not inside a git repository");
            return Err(std::io::Error::other("not inside a git repository"));
        }
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(PathBuf::from(stdout))
    }

    async fn get_origin_info(&self, path: &Path) -> String {
        tracing::debug!(path = %path.display(), "git config --get remote.origin.url");
        let output = Command::new("git")
            .arg("config")
            .arg("--get")
            .arg("remote.origin.url")
            .current_dir(path)
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                String::from_utf8_lossy(&out.stdout).trim().to_string()
            }
            Ok(out) => {
                tracing::debug!(
                    status = %out.status,
                    "no origin configured, treating as empty"
                );
                String::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to spawn git config");
                String::new()
            }
        }
    }
}

/// Best-effort derivation of `(repo_id, repo_root)` for `path`, used for
/// the resolution context's CWD scope. Errors are swallowed to `None` —
/// a directory outside any repo is a normal, non-fatal outcome here.
pub async fn derive_for_cwd(
    git: &dyn GitCollaborator,
    path: &Path,
) -> Option<(String, PathBuf)> {
    let root = git.get_repo_root(path).await.ok()?;
    let origin = git.get_origin_info(&root).await;
    let repo_id = derive_repo_identity(&root, &origin);
    Some((repo_id, root))
}
