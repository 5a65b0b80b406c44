//! The pane controller — exclusive ownership of one terminal surface.
//!
//! All mutating operations (`send`, `capture`, `clear`,
//! `execute_and_capture`, `stop`) acquire the same lock for their whole
//! duration, including the fixed settle waits. That serialization is the
//! mediator's core correctness guarantee.

use std::sync::Arc;
use std::time::Duration;

use panepilot_core::error::PaneError;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::multiplexer::Multiplexer;

/// Exclusive ownership of one multiplexer pane.
#[derive(Debug, Clone)]
pub struct PaneSession {
    /// Name of the ambient multiplexer session
    pub session: String,

    /// Identifier of the secondary pane we created
    pub pane_id: String,

    /// False once the pane has been torn down
    pub running: bool,
}

/// Tunables for the controller.
#[derive(Debug, Clone)]
pub struct PaneOptions {
    /// Wait applied after the clear and after sending a command, before
    /// capturing output. There is no synchronous "command finished"
    /// signal; short-running commands are assumed.
    pub settle: Duration,

    /// Clear the pane before each dispatched command.
    pub clear_before_execute: bool,
}

impl Default for PaneOptions {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            clear_before_execute: true,
        }
    }
}

/// Race-free channel to the single visible execution surface.
pub struct PaneController {
    mux: Arc<dyn Multiplexer>,
    options: PaneOptions,
    inner: Mutex<PaneSession>,
}

impl PaneController {
    /// Discover the ambient multiplexer session and create the secondary
    /// pane inside it.
    ///
    /// Fails with [`PaneError::Environment`] when no session is detected.
    pub async fn create(mux: Arc<dyn Multiplexer>, options: PaneOptions) -> Result<Self, PaneError> {
        let session = mux.current_session().await?;
        let pane_id = mux.split_window().await?;
        info!(%session, %pane_id, "Created secondary pane");

        Ok(Self {
            mux,
            options,
            inner: Mutex::new(PaneSession {
                session,
                pane_id,
                running: true,
            }),
        })
    }

    /// Type a command into the pane, as if the user typed it and pressed
    /// enter.
    pub async fn send(&self, command: &str) -> Result<(), PaneError> {
        let session = self.inner.lock().await;
        if !session.running {
            return Err(PaneError::Closed);
        }
        self.mux.send_line(&session.pane_id, command).await
    }

    /// Clear the pane's screen.
    pub async fn clear(&self) -> Result<(), PaneError> {
        let session = self.inner.lock().await;
        if !session.running {
            return Err(PaneError::Closed);
        }
        self.mux.send_line(&session.pane_id, "clear").await
    }

    /// Read the pane's currently visible contents, trimmed.
    pub async fn capture(&self) -> Result<String, PaneError> {
        let session = self.inner.lock().await;
        if !session.running {
            return Err(PaneError::Closed);
        }
        let output = self.mux.capture_pane(&session.pane_id).await?;
        Ok(output.trim().to_string())
    }

    /// Clear the pane, run a command, and capture its output.
    ///
    /// Holds the lock across the whole sequence so no other pane operation
    /// can interleave with the clear / send / capture of this command.
    pub async fn execute_and_capture(&self, command: &str) -> Result<String, PaneError> {
        let session = self.inner.lock().await;
        if !session.running {
            return Err(PaneError::Closed);
        }

        debug!(%command, pane = %session.pane_id, "Executing command in pane");

        if self.options.clear_before_execute {
            self.mux.send_line(&session.pane_id, "clear").await?;
            tokio::time::sleep(self.options.settle).await;
        }

        self.mux.send_line(&session.pane_id, command).await?;
        tokio::time::sleep(self.options.settle).await;

        let output = self.mux.capture_pane(&session.pane_id).await?;
        Ok(output.trim().to_string())
    }

    /// Mark the session non-running and tear the pane down.
    ///
    /// Safe to call more than once; later calls are no-ops. Every other
    /// operation after `stop` fails with [`PaneError::Closed`].
    pub async fn stop(&self) -> Result<(), PaneError> {
        let mut session = self.inner.lock().await;
        if !session.running {
            return Ok(());
        }
        session.running = false;
        info!(pane = %session.pane_id, "Tearing down pane");
        self.mux.kill_pane(&session.pane_id).await
    }

    /// Whether the pane session is still live.
    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Records every multiplexer operation in order.
    struct ScriptedMultiplexer {
        log: StdMutex<Vec<String>>,
        capture_output: String,
    }

    impl ScriptedMultiplexer {
        fn new(capture_output: &str) -> Arc<Self> {
            Arc::new(Self {
                log: StdMutex::new(Vec::new()),
                capture_output: capture_output.into(),
            })
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn record(&self, entry: String) {
            self.log.lock().unwrap().push(entry);
        }
    }

    #[async_trait]
    impl Multiplexer for ScriptedMultiplexer {
        async fn current_session(&self) -> Result<String, PaneError> {
            Ok("main".into())
        }

        async fn split_window(&self) -> Result<String, PaneError> {
            Ok("%1".into())
        }

        async fn send_line(&self, _pane: &str, line: &str) -> Result<(), PaneError> {
            self.record(format!("send:{line}"));
            // Yield so a badly-synchronized controller would interleave here.
            tokio::task::yield_now().await;
            Ok(())
        }

        async fn capture_pane(&self, _pane: &str) -> Result<String, PaneError> {
            self.record("capture".into());
            Ok(self.capture_output.clone())
        }

        async fn kill_pane(&self, _pane: &str) -> Result<(), PaneError> {
            self.record("kill".into());
            Ok(())
        }
    }

    async fn controller(mux: Arc<ScriptedMultiplexer>) -> PaneController {
        PaneController::create(
            mux,
            PaneOptions {
                settle: Duration::from_millis(1),
                clear_before_execute: true,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn execute_clears_sends_then_captures() {
        let mux = ScriptedMultiplexer::new("  hello\n");
        let pane = controller(mux.clone()).await;

        let output = pane.execute_and_capture("echo hello").await.unwrap();
        assert_eq!(output, "hello");
        assert_eq!(mux.log(), vec!["send:clear", "send:echo hello", "capture"]);
    }

    #[tokio::test]
    async fn capture_trims_surrounding_whitespace() {
        let mux = ScriptedMultiplexer::new("\n\n  out  \n\n");
        let pane = controller(mux.clone()).await;
        assert_eq!(pane.capture().await.unwrap(), "out");
    }

    #[tokio::test]
    async fn concurrent_executes_never_interleave() {
        let mux = ScriptedMultiplexer::new("ok");
        let pane = Arc::new(controller(mux.clone()).await);

        let a = {
            let pane = pane.clone();
            tokio::spawn(async move { pane.execute_and_capture("first").await })
        };
        let b = {
            let pane = pane.clone();
            tokio::spawn(async move { pane.execute_and_capture("second").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // Each execute must appear as a contiguous clear/send/capture group.
        let log = mux.log();
        assert_eq!(log.len(), 6);
        for group in log.chunks(3) {
            assert_eq!(group[0], "send:clear");
            assert!(group[1].starts_with("send:"));
            assert_eq!(group[2], "capture");
        }
    }

    #[tokio::test]
    async fn operations_after_stop_fail_closed() {
        let mux = ScriptedMultiplexer::new("ok");
        let pane = controller(mux.clone()).await;

        pane.stop().await.unwrap();
        assert!(!pane.is_running().await);

        assert!(matches!(pane.send("ls").await, Err(PaneError::Closed)));
        assert!(matches!(pane.capture().await, Err(PaneError::Closed)));
        assert!(matches!(
            pane.execute_and_capture("ls").await,
            Err(PaneError::Closed)
        ));
        assert!(matches!(pane.clear().await, Err(PaneError::Closed)));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mux = ScriptedMultiplexer::new("ok");
        let pane = controller(mux.clone()).await;

        pane.stop().await.unwrap();
        pane.stop().await.unwrap();

        // The pane is killed exactly once.
        let kills = mux.log().iter().filter(|e| *e == "kill").count();
        assert_eq!(kills, 1);
    }

    #[tokio::test]
    async fn clear_can_be_disabled() {
        let mux = ScriptedMultiplexer::new("ok");
        let pane = PaneController::create(
            mux.clone(),
            PaneOptions {
                settle: Duration::from_millis(1),
                clear_before_execute: false,
            },
        )
        .await
        .unwrap();

        pane.execute_and_capture("ls").await.unwrap();
        assert_eq!(mux.log(), vec!["send:ls", "capture"]);
    }
}
