//! The run data model.
//!
//! A [`RunMeta`] is the durable `meta.json` envelope written by the
//! out-of-core `start`/`new` command. This crate never constructs one from
//! scratch in production code paths (only the `new_for_test` helper does,
//! for unit tests) — it only reads, classifies, and minimally mutates
//! records that already exist on disk.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON envelope version for `meta.json`. Bump when the structure changes
/// in a backwards-incompatible way.
pub const CURRENT_META_VERSION: u8 = 1;

/// Durable per-run metadata (`meta.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunMeta {
    pub schema_version: u8,
    pub run_id: String,
    pub repo_id: String,
    pub title: String,
    pub runner_name: String,
    pub runner_command: Vec<String>,
    pub parent_branch: String,
    pub run_branch: String,
    pub worktree_path: String,
    pub created_at: DateTime<Utc>,
    pub session_name: String,
    #[serde(default, skip_serializing_if = "Flags::is_default")]
    pub flags: Flags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<Archive>,
}

/// Mutable per-run flags. The core only ever sets `needs_attention`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flags {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_attention: bool,
}

impl Flags {
    fn is_default(&self) -> bool {
        !self.needs_attention
    }
}

/// Archive marker. Presence of a non-empty `archived_at` makes a run
/// archived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Archive {
    pub archived_at: DateTime<Utc>,
}

impl RunMeta {
    /// Build a minimal, syntactically valid meta record for unit tests.
    #[cfg(any(test, feature = "test-support"))]
    pub fn new_for_test(repo_id: &str, run_id: &str, name: Option<&str>) -> Self {
        RunMeta {
            schema_version: CURRENT_META_VERSION,
            run_id: run_id.to_string(),
            repo_id: repo_id.to_string(),
            title: name.unwrap_or("untitled").to_string(),
            runner_name: "claude".to_string(),
            runner_command: vec!["claude".to_string()],
            parent_branch: "main".to_string(),
            run_branch: format!("agency/{run_id}"),
            worktree_path: format!("/tmp/agency-test/{run_id}"),
            created_at: Utc::now(),
            session_name: crate::session_name::session_name(run_id),
            flags: Flags::default(),
            archive: None,
        }
    }
}

/// A scanned run directory, with or without a readable `meta.json`.
///
/// `name` is a convenience projection of `meta.title`/`meta`'s stored name
/// when present; it exists so the resolver does not need to know the
/// internal shape of `meta.json` to do name matching.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub repo_id: String,
    pub run_id: String,
    pub name: Option<String>,
    pub meta: Option<RunMeta>,
    pub broken: bool,
}

impl RunRecord {
    /// A run is active when its meta is readable and it carries no
    /// `archive.archived_at`.
    pub fn is_active(&self) -> bool {
        match &self.meta {
            Some(meta) => !self.broken && meta.archive.is_none(),
            None => false,
        }
    }

    /// A run is archived when its meta is readable and carries a
    /// non-empty `archive.archived_at`.
    pub fn is_archived(&self) -> bool {
        match &self.meta {
            Some(meta) => !self.broken && meta.archive.is_some(),
            None => false,
        }
    }
}

/// A durable event log entry (`events.jsonl`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub schema_version: String,
    pub ts: DateTime<Utc>,
    pub repo_id: String,
    pub run_id: String,
    pub event: String,
    pub data: serde_json::Value,
}

impl Event {
    pub const SCHEMA_VERSION: &'static str = "1.0";

    pub fn stop(repo_id: &str, run_id: &str, keys: &[&str]) -> Self {
        Event {
            schema_version: Self::SCHEMA_VERSION.to_string(),
            ts: Utc::now(),
            repo_id: repo_id.to_string(),
            run_id: run_id.to_string(),
            event: "stop".to_string(),
            data: serde_json::json!({ "keys": keys }),
        }
    }

    pub fn kill_session(repo_id: &str, run_id: &str, session_name: &str) -> Self {
        Event {
            schema_version: Self::SCHEMA_VERSION.to_string(),
            ts: Utc::now(),
            repo_id: repo_id.to_string(),
            run_id: run_id.to_string(),
            event: "kill_session".to_string(),
            data: serde_json::json!({ "session_name": session_name }),
        }
    }
}

/// Extra key/value context threaded into error `details` maps. Small
/// helper so call sites read as `details(&[("run_id", &id)])` instead of
/// building a `BTreeMap` by hand each time.
pub fn details(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_requires_meta_and_no_archive() {
        let mut record = RunRecord {
            repo_id: "r".into(),
            run_id: "20260110120000-a3f2".into(),
            name: Some("x".into()),
            meta: Some(RunMeta::new_for_test("r", "20260110120000-a3f2", Some("x"))),
            broken: false,
        };
        assert!(record.is_active());
        assert!(!record.is_archived());

        record.meta.as_mut().unwrap().archive = Some(Archive {
            archived_at: Utc::now(),
        });
        assert!(!record.is_active());
        assert!(record.is_archived());
    }

    #[test]
    fn broken_run_is_neither_active_nor_archived() {
        let record = RunRecord {
            repo_id: "r".into(),
            run_id: "20260110120000-a3f2".into(),
            name: None,
            meta: None,
            broken: true,
        };
        assert!(!record.is_active());
        assert!(!record.is_archived());
    }
}
