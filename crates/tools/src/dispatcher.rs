//! Tool dispatch — turning a model-issued tool call into a tool message.
//!
//! Every dispatch yields exactly one `tool` message tagged with the
//! originating call's id. Failures the model can react to (unknown tool,
//! malformed arguments, execution errors) are rendered as message content,
//! never propagated as errors: the model can only read text.

use std::sync::Arc;

use panepilot_core::error::ToolError;
use panepilot_core::message::Message;
use panepilot_core::tool::ToolCall;
use panepilot_pane::PaneController;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::kind::ToolKind;
use crate::path_scan;

/// The single recognized argument shape for every tool.
#[derive(Debug, Deserialize)]
struct ToolRequest {
    cmd: String,
}

/// Executes tool calls against the pane and the host environment.
pub struct ToolDispatcher {
    pane: Arc<PaneController>,
}

impl ToolDispatcher {
    pub fn new(pane: Arc<PaneController>) -> Self {
        Self { pane }
    }

    /// Dispatch one tool call, producing the answering tool message.
    pub async fn dispatch(&self, call: &ToolCall) -> Message {
        let Some(kind) = ToolKind::from_name(&call.name) else {
            warn!(tool = %call.name, "Model requested an unknown tool");
            return Message::tool_result(&call.id, format!("no tool named {}", call.name));
        };

        let request: ToolRequest = match serde_json::from_str(&call.arguments) {
            Ok(req) => req,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Malformed tool arguments");
                return Message::tool_result(&call.id, format!("invalid tool arguments: {e}"));
            }
        };

        debug!(tool = kind.name(), cmd = %request.cmd, "Dispatching tool call");

        let content = match self.run(kind, &request.cmd).await {
            Ok(output) => output,
            // Reported as content so the model can react in language.
            Err(e) => format!("error in executing {}: {e}", kind.name()),
        };

        Message::tool_result(&call.id, content)
    }

    async fn run(&self, kind: ToolKind, cmd: &str) -> Result<String, ToolError> {
        match kind {
            ToolKind::CheckCommand => {
                let path = std::env::var("PATH").unwrap_or_default();
                Ok(path_scan::resolve_on_path(&path, cmd).to_string())
            }
            ToolKind::ExecuteCommand => self
                .pane
                .execute_and_capture(cmd)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: kind.name().into(),
                    reason: e.to_string(),
                }),
            ToolKind::GetAvailableCommands => {
                let path = std::env::var("PATH").unwrap_or_default();
                path_scan::scan_matching(&path, cmd).map(|names| names.join(","))
            }
        }
    }
}
