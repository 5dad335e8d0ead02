//! Record Store.
//!
//! Directory layout rooted at `data_dir`:
//! `repos/<repo_id>/runs/<run_id>/{meta.json, events.jsonl, logs/}`.
//! Grounded on `codex-session::store` (`paths_for`, `list_sessions`,
//! `write_meta`) generalized from a flat `sessions/<id>/` layout to this
//! two-level `repos/<repo_id>/runs/<run_id>/` layout, and on
//! `code-core::rollout::recorder`'s `JsonlWriter` for the append-only
//! event log.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::AgencyError;
use crate::model::{Event, RunMeta, RunRecord};

const REPOS_DIR: &str = "repos";
const RUNS_DIR: &str = "runs";
const META_FILE: &str = "meta.json";
const EVENTS_FILE: &str = "events.jsonl";

/// Resolve the data directory: `AGENCY_DATA_DIR` env var if set, else
/// `~/.agency`.
pub fn resolve_data_dir() -> Result<PathBuf, AgencyError> {
    if let Ok(dir) = std::env::var("AGENCY_DATA_DIR") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = dirs::home_dir()
        .ok_or_else(|| AgencyError::internal("could not resolve home directory"))?;
    Ok(home.join(".agency"))
}

/// Pure: the on-disk directory for a given `(repo_id, run_id)`.
pub fn run_dir(data_dir: &Path, repo_id: &str, run_id: &str) -> PathBuf {
    data_dir
        .join(REPOS_DIR)
        .join(repo_id)
        .join(RUNS_DIR)
        .join(run_id)
}

fn meta_path(data_dir: &Path, repo_id: &str, run_id: &str) -> PathBuf {
    run_dir(data_dir, repo_id, run_id).join(META_FILE)
}

fn events_path(data_dir: &Path, repo_id: &str, run_id: &str) -> PathBuf {
    run_dir(data_dir, repo_id, run_id).join(EVENTS_FILE)
}

/// Read and parse `meta.json` for a given run.
pub async fn read_meta(
    data_dir: &Path,
    repo_id: &str,
    run_id: &str,
) -> Result<RunMeta, AgencyError> {
    let path = meta_path(data_dir, repo_id, run_id);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AgencyError::internal(format!("reading {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AgencyError::internal(format!("parsing {}: {e}", path.display())))
}

/// Enumerate every `repos/*/runs/*` directory under `data_dir`.
///
/// Never fails the overall call for one unreadable record: an unreadable
/// or unparseable `meta.json` just sets `broken = true`. Only fails on
/// I/O errors that prevent listing the directory tree at all.
pub async fn scan_all_runs(data_dir: &Path) -> Result<Vec<RunRecord>, AgencyError> {
    let repos_root = data_dir.join(REPOS_DIR);
    let mut records = Vec::new();

    let mut repo_entries = match tokio::fs::read_dir(&repos_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(records),
        Err(e) => {
            return Err(AgencyError::internal(format!(
                "listing {}: {e}",
                repos_root.display()
            )))
        }
    };

    while let Some(repo_entry) = repo_entries
        .next_entry()
        .await
        .map_err(|e| AgencyError::internal(format!("listing {}: {e}", repos_root.display())))?
    {
        if !is_dir(&repo_entry).await {
            continue;
        }
        let repo_id = match repo_entry.file_name().into_string() {
            Ok(s) => s,
            Err(_) => continue, // non-UTF8 directory name: not a valid repo_id, skip
        };

        let runs_root = repo_entry.path().join(RUNS_DIR);
        let mut run_entries = match tokio::fs::read_dir(&runs_root).await {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        while let Some(run_entry) = run_entries.next_entry().await.unwrap_or(None) {
            if !is_dir(&run_entry).await {
                continue;
            }
            let run_id = match run_entry.file_name().into_string() {
                Ok(s) => s,
                Err(_) => continue,
            };

            let meta_file = run_entry.path().join(META_FILE);
            let (meta, broken, name) = match tokio::fs::read(&meta_file).await {
                Ok(bytes) => match serde_json::from_slice::<RunMeta>(&bytes) {
                    Ok(meta) => {
                        let name = Some(meta.title.clone());
                        (Some(meta), false, name)
                    }
                    Err(_) => (None, true, None),
                },
                Err(_) => (None, true, None),
            };

            records.push(RunRecord {
                repo_id: repo_id.clone(),
                run_id,
                name,
                meta,
                broken,
            });
        }
    }

    Ok(records)
}

async fn is_dir(entry: &tokio::fs::DirEntry) -> bool {
    entry
        .file_type()
        .await
        .map(|t| t.is_dir())
        .unwrap_or(false)
}

/// Atomically append one JSON line to the run's event log, creating the
/// file and its parent directory if missing. A single `write_all` call on
/// a file opened with `append(true)` is used so concurrent appenders
/// (same or different processes) never interleave the bytes of one
/// record — the kernel serializes `O_APPEND` writes at the syscall level
/// for writes that fit in one call, which a single JSON line always does.
pub async fn append_event(
    data_dir: &Path,
    repo_id: &str,
    run_id: &str,
    event: &Event,
) -> Result<(), AgencyError> {
    let dir = run_dir(data_dir, repo_id, run_id);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(AgencyError::persist_failed)?;

    let mut line = serde_json::to_string(event).map_err(AgencyError::persist_failed)?;
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(events_path(data_dir, repo_id, run_id))
        .await
        .map_err(AgencyError::persist_failed)?;
    file.write_all(line.as_bytes())
        .await
        .map_err(AgencyError::persist_failed)?;
    file.flush().await.map_err(AgencyError::persist_failed)?;
    Ok(())
}

/// Read-modify-write `meta.json` atomically via temp-file-plus-rename.
/// `mutate` receives the current meta and mutates it in place.
pub async fn update_meta<F>(
    data_dir: &Path,
    repo_id: &str,
    run_id: &str,
    mutate: F,
) -> Result<(), AgencyError>
where
    F: FnOnce(&mut RunMeta),
{
    let path = meta_path(data_dir, repo_id, run_id);
    let mut meta = read_meta(data_dir, repo_id, run_id).await?;
    mutate(&mut meta);

    let json = serde_json::to_vec_pretty(&meta).map_err(AgencyError::persist_failed)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(AgencyError::persist_failed)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(AgencyError::persist_failed)?;
    Ok(())
}

/// Set `meta.flags.needs_attention` for a run (the only meta mutation the
/// core performs, used by `stop`).
pub async fn set_needs_attention(
    data_dir: &Path,
    repo_id: &str,
    run_id: &str,
    value: bool,
) -> Result<(), AgencyError> {
    update_meta(data_dir, repo_id, run_id, |meta| {
        meta.flags.needs_attention = value;
    })
    .await
}
