//! Resolver.
//!
//! Turns a user-supplied reference (name, full id, or id-prefix) into a
//! unique `(repo_id, run_id)`, scoped by explicit `--repo`, then the CWD
//! repo, then globally. Grounded on
//! `codex-session::store::resolve_selector`'s three-tier index/exact/
//! prefix resolution, generalized to a two-branch id-then-name algorithm
//! with CWD and explicit-repo scoping.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::error::AgencyError;
use crate::id::{is_exact_run_id, is_run_id_prefix, resolve_by_id, IdResolution};
use crate::identity::{derive_for_cwd, derive_repo_identity, GitCollaborator};
use crate::model::{details, RunRecord};
use crate::{error::format_candidates, store};

/// Per-invocation resolution context: the data directory plus whatever
/// repo scopes (CWD, explicit `--repo`) could be derived for this
/// invocation.
pub struct ResolutionContext {
    pub data_dir: PathBuf,
    pub cwd_repo_id: Option<String>,
    pub cwd_repo_root: Option<PathBuf>,
    pub explicit_repo_id: Option<String>,
    pub explicit_repo_root: Option<PathBuf>,
}

/// Race `fut` against `token`, so a controlling SIGINT aborts a hung git
/// call promptly instead of leaving the command stuck.
async fn cancellable<T>(
    token: &CancellationToken,
    fut: impl std::future::Future<Output = Result<T, AgencyError>>,
) -> Result<T, AgencyError> {
    tokio::select! {
        result = fut => result,
        _ = token.cancelled() => Err(AgencyError::internal("operation cancelled")),
    }
}

impl ResolutionContext {
    /// Build a context for a command invocation: resolve the data
    /// directory, best-effort derive the CWD repo, and validate an
    /// explicit `--repo` path if one was given. `token` cancels the git
    /// subprocess calls this makes if the caller is interrupted.
    pub async fn build(
        git: &dyn GitCollaborator,
        cwd: &Path,
        explicit_repo: Option<&Path>,
        token: &CancellationToken,
    ) -> Result<Self, AgencyError> {
        let data_dir = store::resolve_data_dir()?;
        let (cwd_repo_id, cwd_repo_root) =
            match cancellable(token, async { Ok(derive_for_cwd(git, cwd).await) }).await? {
                Some((id, root)) => (Some(id), Some(root)),
                None => (None, None),
            };

        let (explicit_repo_id, explicit_repo_root) = match explicit_repo {
            None => (None, None),
            Some(path) => {
                let canonical = tokio::fs::canonicalize(path).await.map_err(|_| {
                    AgencyError::InvalidRepoPath {
                        message: format!("{} does not exist", path.display()),
                        details: details(&[("path", &path.display().to_string())]),
                    }
                })?;
                let root = cancellable(token, async {
                    git.get_repo_root(&canonical).await.map_err(|_| {
                        AgencyError::InvalidRepoPath {
                            message: format!(
                                "{} is not inside a git repository",
                                path.display()
                            ),
                            details: details(&[("path", &path.display().to_string())]),
                        }
                    })
                })
                .await?;
                let origin =
                    cancellable(token, async { Ok(git.get_origin_info(&root).await) }).await?;
                let repo_id = derive_repo_identity(&root, &origin);
                (Some(repo_id), Some(root))
            }
        };

        Ok(ResolutionContext {
            data_dir,
            cwd_repo_id,
            cwd_repo_root,
            explicit_repo_id,
            explicit_repo_root,
        })
    }
}

/// The outcome of a successful resolution: the full run identity plus a
/// best-effort repo root the caller can use without re-deriving it from
/// meta.
pub struct ResolvedRun {
    pub repo_id: String,
    pub run_id: String,
    pub name: Option<String>,
    pub broken: bool,
    pub record: RunRecord,
    pub repo_root: Option<PathBuf>,
}

/// Resolve a non-empty, trimmed user reference against every run under
/// `ctx.data_dir`: an exact or prefix id match wins outright regardless of
/// scope, otherwise fall back to name matching, preferring an explicit
/// `--repo` scope, then the CWD repo, then the full global set.
pub async fn resolve(ctx: &ResolutionContext, input: &str) -> Result<ResolvedRun, AgencyError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AgencyError::usage("a run reference is required"));
    }

    let all_runs = store::scan_all_runs(&ctx.data_dir).await?;

    if is_exact_run_id(input) || is_run_id_prefix(input) {
        match resolve_by_id(input, &all_runs) {
            IdResolution::Found(record) => return Ok(finish(ctx, record.clone())),
            IdResolution::Ambiguous(candidates) => {
                let owned: Vec<RunRecord> = candidates.into_iter().cloned().collect();
                return Err(AgencyError::RunIdAmbiguous {
                    details: ambiguity_details(&owned),
                });
            }
            IdResolution::NotFound => {
                // Falls through to name resolution: an id-shaped input
                // that matches nothing is still worth trying as a name.
            }
        }
    }

    let active: Vec<&RunRecord> = all_runs.iter().filter(|r| r.is_active()).collect();

    if let Some(repo_id) = &ctx.explicit_repo_id {
        let matches: Vec<&&RunRecord> = active
            .iter()
            .filter(|r| &r.repo_id == repo_id && r.name.as_deref() == Some(input))
            .collect();
        return match matches.len() {
            0 => Err(AgencyError::RunNotFound {
                message: format!("no run named '{input}' in repo {repo_id}"),
            }),
            1 => Ok(finish(ctx, (*matches[0]).clone())),
            _ => Err(AgencyError::RunRefAmbiguous {
                details: ambiguity_details(&owned(&matches)),
            }),
        };
    }

    if let Some(cwd_repo_id) = &ctx.cwd_repo_id {
        let has_any_active_in_cwd_repo = active.iter().any(|r| &r.repo_id == cwd_repo_id);
        if has_any_active_in_cwd_repo {
            let matches: Vec<&&RunRecord> = active
                .iter()
                .filter(|r| &r.repo_id == cwd_repo_id && r.name.as_deref() == Some(input))
                .collect();
            if matches.len() == 1 {
                return Ok(finish(ctx, (*matches[0]).clone()));
            }
            // Zero or multiple matches inside the CWD repo fall through to
            // global resolution rather than erroring.
        }
    }

    let global_matches: Vec<&&RunRecord> = active
        .iter()
        .filter(|r| r.name.as_deref() == Some(input))
        .collect();
    match global_matches.len() {
        0 => Err(AgencyError::RunNotFound {
            message: format!("no run named '{input}'"),
        }),
        1 => Ok(finish(ctx, (*global_matches[0]).clone())),
        _ => Err(AgencyError::RunRefAmbiguous {
            details: ambiguity_details(&owned(&global_matches)),
        }),
    }
}

fn owned(matches: &[&&RunRecord]) -> Vec<RunRecord> {
    matches.iter().map(|r| (**r).clone()).collect()
}

fn ambiguity_details(candidates: &[RunRecord]) -> std::collections::BTreeMap<String, String> {
    details(&[("candidates", &format_candidates(candidates))])
}

fn finish(ctx: &ResolutionContext, record: RunRecord) -> ResolvedRun {
    let repo_root = if ctx.explicit_repo_id.as_deref() == Some(record.repo_id.as_str()) {
        ctx.explicit_repo_root.clone()
    } else if ctx.cwd_repo_id.as_deref() == Some(record.repo_id.as_str()) {
        ctx.cwd_repo_root.clone()
    } else {
        None
    };

    ResolvedRun {
        repo_id: record.repo_id.clone(),
        run_id: record.run_id.clone(),
        name: record.name.clone(),
        broken: record.broken,
        record,
        repo_root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SystemGit;
    use crate::model::RunMeta;
    use pretty_assertions::assert_eq;

    fn ctx(data_dir: PathBuf) -> ResolutionContext {
        ResolutionContext {
            data_dir,
            cwd_repo_id: None,
            cwd_repo_root: None,
            explicit_repo_id: None,
            explicit_repo_root: None,
        }
    }

    fn ctx_with_cwd(data_dir: PathBuf, cwd_repo_id: &str) -> ResolutionContext {
        ResolutionContext {
            data_dir,
            cwd_repo_id: Some(cwd_repo_id.to_string()),
            cwd_repo_root: Some(PathBuf::from("/cwd")),
            explicit_repo_id: None,
            explicit_repo_root: None,
        }
    }

    async fn seed(data_dir: &Path, repo_id: &str, run_id: &str, name: &str) {
        let dir = store::run_dir(data_dir, repo_id, run_id);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let meta = RunMeta::new_for_test(repo_id, run_id, Some(name));
        tokio::fs::write(dir.join("meta.json"), serde_json::to_vec_pretty(&meta).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn exact_id_resolves_regardless_of_scope() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "repoA", "20260110120000-a3f2", "refactor").await;

        let context = ctx(tmp.path().to_path_buf());
        let resolved = resolve(&context, "20260110120000-a3f2").await.unwrap();
        assert_eq!(resolved.repo_id, "repoA");
    }

    #[tokio::test]
    async fn name_ambiguous_across_repos_without_scope() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "repoA", "20260110120000-a3f2", "refactor").await;
        seed(tmp.path(), "repoB", "20260110130000-9911", "refactor").await;

        let context = ctx(tmp.path().to_path_buf());
        let err = resolve(&context, "refactor").await.unwrap_err();
        assert_eq!(err.code(), "ERunRefAmbiguous");
        let rendered = err.details().unwrap().get("candidates").unwrap().clone();
        assert!(rendered.contains("repoA"));
        assert!(rendered.contains("repoB"));
    }

    #[tokio::test]
    async fn cwd_preference_resolves_uniquely_inside_its_repo() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "repoA", "20260110120000-a3f2", "refactor").await;
        seed(tmp.path(), "repoB", "20260110130000-9911", "refactor").await;

        let context = ctx_with_cwd(tmp.path().to_path_buf(), "repoA");
        let resolved = resolve(&context, "refactor").await.unwrap();
        assert_eq!(resolved.repo_id, "repoA");
    }

    #[tokio::test]
    async fn id_prefix_collision_is_ambiguous_then_unique_suffix_resolves() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "repoA", "20260110120000-a3f2", "one").await;
        seed(tmp.path(), "repoA", "20260110120000-a3f7", "two").await;

        let context = ctx(tmp.path().to_path_buf());
        let err = resolve(&context, "20260110120000-a").await.unwrap_err();
        assert_eq!(err.code(), "ERunIDAmbiguous");

        let resolved = resolve(&context, "20260110120000-a3f2").await.unwrap();
        assert_eq!(resolved.run_id, "20260110120000-a3f2");
    }

    #[tokio::test]
    async fn archived_run_is_not_addressable_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = store::run_dir(tmp.path(), "repoA", "20260110120000-a3f2");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let mut meta = RunMeta::new_for_test("repoA", "20260110120000-a3f2", Some("old"));
        meta.archive = Some(crate::model::Archive {
            archived_at: chrono::Utc::now(),
        });
        tokio::fs::write(dir.join("meta.json"), serde_json::to_vec_pretty(&meta).unwrap())
            .await
            .unwrap();

        let context = ctx(tmp.path().to_path_buf());
        let err = resolve(&context, "old").await.unwrap_err();
        assert_eq!(err.code(), "ERunNotFound");

        // But still addressable by id.
        let resolved = resolve(&context, "20260110120000-a3f2").await.unwrap();
        assert!(resolved.record.is_archived());
    }

    #[tokio::test]
    async fn broken_run_is_a_valid_id_ambiguity_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path(), "repoA", "20260110120000-a3f2", "one").await;
        let broken_dir = store::run_dir(tmp.path(), "repoA", "20260110120000-a3f7");
        tokio::fs::create_dir_all(&broken_dir).await.unwrap();
        tokio::fs::write(broken_dir.join("meta.json"), b"not json")
            .await
            .unwrap();

        let context = ctx(tmp.path().to_path_buf());
        let err = resolve(&context, "20260110120000-a").await.unwrap_err();
        assert_eq!(err.code(), "ERunIDAmbiguous");
    }

    async fn init_repo(dir: &Path) {
        for args in [
            vec!["init", "-q"],
            vec!["config", "user.email", "test@example.com"],
            vec!["config", "user.name", "Test"],
        ] {
            let status = tokio::process::Command::new("git")
                .args(&args)
                .current_dir(dir)
                .status()
                .await
                .expect("spawn git");
            assert!(status.success(), "git {args:?} failed");
        }
    }

    #[tokio::test]
    async fn build_derives_the_cwd_repo_from_a_real_git_checkout() {
        let data_dir = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        init_repo(repo.path()).await;

        let git = SystemGit;
        std::env::set_var("AGENCY_DATA_DIR", data_dir.path());
        let built = ResolutionContext::build(&git, repo.path(), None, &CancellationToken::new())
            .await
            .unwrap();
        std::env::remove_var("AGENCY_DATA_DIR");

        assert!(built.cwd_repo_id.is_some());
        assert_eq!(
            tokio::fs::canonicalize(built.cwd_repo_root.unwrap())
                .await
                .unwrap(),
            tokio::fs::canonicalize(repo.path()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn build_rejects_an_explicit_repo_path_outside_any_repository() {
        let data_dir = tempfile::tempdir().unwrap();
        let not_a_repo = tempfile::tempdir().unwrap();

        let git = SystemGit;
        std::env::set_var("AGENCY_DATA_DIR", data_dir.path());
        let err = ResolutionContext::build(
            &git,
            not_a_repo.path(),
            Some(not_a_repo.path()),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        std::env::remove_var("AGENCY_DATA_DIR");

        assert_eq!(err.code(), "EInvalidRepoPath");
    }

    #[tokio::test]
    async fn build_rejects_an_explicit_repo_path_that_does_not_exist() {
        let data_dir = tempfile::tempdir().unwrap();
        let missing = data_dir.path().join("does-not-exist");

        let git = SystemGit;
        std::env::set_var("AGENCY_DATA_DIR", data_dir.path());
        let err = ResolutionContext::build(&git, &missing, Some(&missing), &CancellationToken::new())
            .await
            .unwrap_err();
        std::env::remove_var("AGENCY_DATA_DIR");

        assert_eq!(err.code(), "EInvalidRepoPath");
    }
}
