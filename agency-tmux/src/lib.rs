//! Session Driver.
//!
//! An abstract capability over a terminal multiplexer with exactly five
//! operations. Grounded on `agency_core::identity::SystemGit`'s shell-out
//! pattern (a real binary invoked through `tokio::process::Command`), with
//! binary discovery delegated to the `which` crate the way a missing
//! collaborator is usually detected in this corpus rather than inferred
//! from a spawn error alone.

use std::path::Path;

use agency_core::AgencyError;
use async_trait::async_trait;
use tokio::process::Command;

/// The five operations this driver abstraction allows, no more.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    async fn has_session(&self, name: &str) -> Result<bool, AgencyError>;
    async fn new_session(&self, name: &str, cwd: &Path, argv: &[String]) -> Result<(), AgencyError>;
    async fn send_keys(&self, name: &str, keys: &[&str]) -> Result<(), AgencyError>;
    async fn kill_session(&self, name: &str) -> Result<(), AgencyError>;
    async fn attach(&self, name: &str) -> Result<(), AgencyError>;
}

/// Drives the real `tmux` binary.
#[derive(Debug, Clone)]
pub struct TmuxDriver {
    binary: std::path::PathBuf,
}

impl TmuxDriver {
    /// Locate the `tmux` binary on `PATH`. `ETmuxNotInstalled` is surfaced
    /// here rather than deferred to the first failed spawn, so every other
    /// operation can assume the binary exists.
    pub fn locate() -> Result<Self, AgencyError> {
        let binary = which::which("tmux").map_err(|e| {
            tracing::warn!(error = %e, "tmux binary not found on PATH");
            AgencyError::TmuxNotInstalled {
                source: Some(e.to_string()),
            }
        })?;
        tracing::debug!(binary = %binary.display(), "located tmux binary");
        Ok(TmuxDriver { binary })
    }

    fn command(&self) -> Command {
        Command::new(&self.binary)
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, AgencyError> {
        self.command()
            .args(args)
            .output()
            .await
            .map_err(|e| AgencyError::TmuxFailed {
                message: format!("spawning tmux {}: {e}", args.join(" ")),
            })
    }
}

#[async_trait]
impl SessionDriver for TmuxDriver {
    async fn has_session(&self, name: &str) -> Result<bool, AgencyError> {
        tracing::debug!(session = name, "tmux has-session");
        let output = self.run(&["has-session", "-t", name]).await?;
        // tmux has-session exits 0 when the session exists, 1 when it does
        // not; any other nonzero status is a real failure of the driver.
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => {
                tracing::warn!(session = name, status = ?output.status, "tmux has-session failed");
                Err(AgencyError::TmuxFailed {
                    message: format!(
                        "tmux has-session -t {name}: {}",
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                })
            }
        }
    }

    async fn new_session(&self, name: &str, cwd: &Path, argv: &[String]) -> Result<(), AgencyError> {
        tracing::debug!(session = name, cwd = %cwd.display(), "tmux new-session");
        let mut args: Vec<String> = vec![
            "new-session".into(),
            "-d".into(),
            "-s".into(),
            name.into(),
            "-c".into(),
            cwd.display().to_string(),
        ];
        args.extend(argv.iter().cloned());
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run(&arg_refs).await?;
        if !output.status.success() {
            tracing::warn!(session = name, status = ?output.status, "tmux new-session failed");
            return Err(AgencyError::TmuxFailed {
                message: format!(
                    "tmux new-session -t {name}: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }

    async fn send_keys(&self, name: &str, keys: &[&str]) -> Result<(), AgencyError> {
        tracing::debug!(session = name, ?keys, "tmux send-keys");
        let mut args: Vec<&str> = vec!["send-keys", "-t", name];
        args.extend_from_slice(keys);
        args.push("Enter");
        let output = self.run(&args).await?;
        if !output.status.success() {
            tracing::warn!(session = name, status = ?output.status, "tmux send-keys failed");
            return Err(AgencyError::TmuxFailed {
                message: format!(
                    "tmux send-keys -t {name}: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), AgencyError> {
        tracing::debug!(session = name, "tmux kill-session");
        let output = self.run(&["kill-session", "-t", name]).await?;
        if !output.status.success() {
            tracing::warn!(session = name, status = ?output.status, "tmux kill-session failed");
            return Err(AgencyError::TmuxFailed {
                message: format!(
                    "tmux kill-session -t {name}: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }

    /// Hands off to an interactive `tmux attach-session`, inheriting the
    /// controlling TTY — this is the one driver call that does not capture
    /// output, since the point is for the user to see and drive it live.
    async fn attach(&self, name: &str) -> Result<(), AgencyError> {
        tracing::debug!(session = name, "tmux attach-session");
        let status = self
            .command()
            .args(["attach-session", "-t", name])
            .status()
            .await
            .map_err(|e| {
                tracing::warn!(session = name, error = %e, "failed to spawn tmux attach-session");
                AgencyError::TmuxFailed {
                    message: format!("spawning tmux attach-session -t {name}: {e}"),
                }
            })?;
        if !status.success() {
            tracing::warn!(session = name, status = ?status, "tmux attach-session exited nonzero");
            return Err(AgencyError::TmuxFailed {
                message: format!("tmux attach-session -t {name} exited with {status}"),
            });
        }
        Ok(())
    }
}

/// An in-memory fake used by `agency-cli`'s command tests, mirroring the
/// hand-rolled fakes this corpus writes for its own driver seams rather
/// than pulling in a mocking framework.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct FakeSessionDriver {
        pub sessions: Mutex<BTreeMap<String, Vec<Vec<String>>>>,
        pub fail_has_session: Mutex<bool>,
    }

    impl FakeSessionDriver {
        pub fn with_session(name: &str) -> Self {
            let driver = FakeSessionDriver::default();
            driver
                .sessions
                .lock()
                .unwrap()
                .insert(name.to_string(), Vec::new());
            driver
        }

        pub fn sent_keys(&self, name: &str) -> Vec<Vec<String>> {
            self.sessions
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl SessionDriver for FakeSessionDriver {
        async fn has_session(&self, name: &str) -> Result<bool, AgencyError> {
            if *self.fail_has_session.lock().unwrap() {
                return Err(AgencyError::TmuxNotInstalled { source: None });
            }
            Ok(self.sessions.lock().unwrap().contains_key(name))
        }

        async fn new_session(
            &self,
            name: &str,
            _cwd: &Path,
            _argv: &[String],
        ) -> Result<(), AgencyError> {
            self.sessions
                .lock()
                .unwrap()
                .insert(name.to_string(), Vec::new());
            Ok(())
        }

        async fn send_keys(&self, name: &str, keys: &[&str]) -> Result<(), AgencyError> {
            let mut sessions = self.sessions.lock().unwrap();
            let entry = sessions
                .get_mut(name)
                .ok_or_else(|| AgencyError::TmuxFailed {
                    message: format!("no such session: {name}"),
                })?;
            entry.push(keys.iter().map(|s| s.to_string()).collect());
            Ok(())
        }

        async fn kill_session(&self, name: &str) -> Result<(), AgencyError> {
            self.sessions
                .lock()
                .unwrap()
                .remove(name)
                .ok_or_else(|| AgencyError::TmuxFailed {
                    message: format!("no such session: {name}"),
                })?;
            Ok(())
        }

        async fn attach(&self, name: &str) -> Result<(), AgencyError> {
            if self.sessions.lock().unwrap().contains_key(name) {
                Ok(())
            } else {
                Err(AgencyError::TmuxFailed {
                    message: format!("no such session: {name}"),
                })
            }
        }
    }
}
