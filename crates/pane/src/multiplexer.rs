//! Multiplexer trait — the abstraction over the ambient terminal multiplexer.
//!
//! The controller talks to the multiplexer only through this trait, so
//! tests can substitute a scripted implementation. The real implementation
//! shells out to `tmux`.

use async_trait::async_trait;
use panepilot_core::error::PaneError;
use tokio::process::Command;
use tracing::debug;

/// Primitive operations against the ambient terminal multiplexer.
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// Name of the session this process is running inside.
    ///
    /// Fails with [`PaneError::Environment`] when no ambient session is
    /// detected. A hard dependency, not recoverable.
    async fn current_session(&self) -> Result<String, PaneError>;

    /// Split the current window and return the new pane's identifier.
    async fn split_window(&self) -> Result<String, PaneError>;

    /// Type a line into the pane and press enter.
    async fn send_line(&self, pane: &str, line: &str) -> Result<(), PaneError>;

    /// Read the pane's currently visible contents.
    async fn capture_pane(&self, pane: &str) -> Result<String, PaneError>;

    /// Tear the pane down.
    async fn kill_pane(&self, pane: &str) -> Result<(), PaneError>;
}

/// The tmux implementation of [`Multiplexer`].
pub struct Tmux;

impl Tmux {
    /// Check the well-known environment variable tmux sets inside sessions.
    fn ambient_session_present() -> bool {
        std::env::var("TMUX").map(|v| !v.is_empty()).unwrap_or(false)
    }

    async fn run(action: &str, args: &[&str]) -> Result<String, PaneError> {
        debug!(action, ?args, "Running tmux command");
        let output = Command::new("tmux")
            .args(args)
            .output()
            .await
            .map_err(|e| PaneError::Command {
                action: action.into(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(PaneError::Command {
                action: action.into(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl Multiplexer for Tmux {
    async fn current_session(&self) -> Result<String, PaneError> {
        if !Self::ambient_session_present() {
            return Err(PaneError::Environment(
                "not inside tmux; install tmux and run PanePilot from a tmux session".into(),
            ));
        }

        let output = Self::run("display-message", &["display-message", "-p", "#S"]).await?;
        let session = output.trim().to_string();
        if session.is_empty() {
            return Err(PaneError::Environment("failed to resolve session name".into()));
        }
        Ok(session)
    }

    async fn split_window(&self) -> Result<String, PaneError> {
        let output = Self::run(
            "split-window",
            &["split-window", "-h", "-d", "-P", "-F", "#{pane_id}"],
        )
        .await?;
        Ok(output.trim().to_string())
    }

    async fn send_line(&self, pane: &str, line: &str) -> Result<(), PaneError> {
        Self::run("send-keys", &["send-keys", "-t", pane, line, "Enter"]).await?;
        Ok(())
    }

    async fn capture_pane(&self, pane: &str) -> Result<String, PaneError> {
        Self::run("capture-pane", &["capture-pane", "-t", pane, "-p"]).await
    }

    async fn kill_pane(&self, pane: &str) -> Result<(), PaneError> {
        Self::run("kill-pane", &["kill-pane", "-t", pane]).await?;
        Ok(())
    }
}
