//! Session name derivation.
//!
//! `session_name(run_id) = PREFIX + run_id`. This is the *sole* source of
//! truth for a run's tmux session name — commands must call this function
//! from the resolved `run_id`, never read a stored `session_name` field,
//! so reattaching keeps working across storage migrations.

/// Fixed, build-time constant shared with the non-core `start` command.
/// Must remain byte-stable across releases.
pub const SESSION_NAME_PREFIX: &str = "agency-";

/// Derive the tmux session name for a given `run_id`.
pub fn session_name(run_id: &str) -> String {
    format!("{SESSION_NAME_PREFIX}{run_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_name_is_pure_function_of_run_id() {
        assert_eq!(
            session_name("20260110120000-a3f2"),
            "agency-20260110120000-a3f2"
        );
        assert_eq!(session_name("20260110120000-a3f2"), session_name("20260110120000-a3f2"));
    }

    #[test]
    fn session_name_is_injective_over_distinct_ids() {
        assert_ne!(
            session_name("20260110120000-a3f2"),
            session_name("20260110120000-a3f7")
        );
    }
}
