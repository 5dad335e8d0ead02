//! Run id format.
//!
//! `run_id` is a 14-digit UTC timestamp `YYYYMMDDhhmmss` followed by `-`
//! and 4 lowercase hex characters, e.g. `20260110120000-a3f2`.

use regex_lite::Regex;
use std::sync::OnceLock;

use crate::model::RunRecord;

fn exact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{14}-[a-f0-9]{4}$").expect("valid regex"))
}

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8,14}(-[a-f0-9]{0,4})?$").expect("valid regex"))
}

/// Matches the exact `run_id` grammar: `^\d{14}-[a-f0-9]{4}$`.
pub fn is_exact_run_id(s: &str) -> bool {
    exact_re().is_match(s)
}

/// Matches the looser id-prefix grammar: `^\d{8,14}(-[a-f0-9]{0,4})?$`.
/// An exact id is always also a valid prefix.
pub fn is_run_id_prefix(s: &str) -> bool {
    prefix_re().is_match(s)
}

/// Outcome of matching a user-supplied id or id-prefix against a set of
/// run records.
pub enum IdResolution<'a> {
    Found(&'a RunRecord),
    NotFound,
    Ambiguous(Vec<&'a RunRecord>),
}

/// Resolve `input` (already known to satisfy [`is_exact_run_id`] or
/// [`is_run_id_prefix`]) against `refs`.
///
/// Precedence: an exact `run_id` equality match wins outright if unique.
/// Otherwise fall back to prefix matching. Candidate order mirrors the
/// order `refs` was given in.
pub fn resolve_by_id<'a>(input: &str, refs: &'a [RunRecord]) -> IdResolution<'a> {
    let exact: Vec<&RunRecord> = refs.iter().filter(|r| r.run_id == input).collect();
    if exact.len() == 1 {
        return IdResolution::Found(exact[0]);
    }
    if exact.len() > 1 {
        return IdResolution::Ambiguous(exact);
    }

    let prefixed: Vec<&RunRecord> = refs
        .iter()
        .filter(|r| r.run_id.starts_with(input))
        .collect();
    match prefixed.len() {
        0 => IdResolution::NotFound,
        1 => IdResolution::Found(prefixed[0]),
        _ => IdResolution::Ambiguous(prefixed),
    }
}
