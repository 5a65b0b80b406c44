//! Events emitted while a turn chain runs, and the sink they go to.
//!
//! Delivery is fire-and-forget: a slow or departed consumer never stalls
//! the turn. Events are serializable so a frontend can relay them as-is.

use serde::{Deserialize, Serialize};

/// Events streamed to the display while the agent works.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// A fragment of assistant text, in arrival order.
    Delta { content: String },

    /// The model refused to answer.
    Refusal { content: String },

    /// A tool call completed accumulating and is about to run.
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },

    /// A tool finished; `output` is the content handed back to the model.
    ToolResult { id: String, output: String },

    /// The chain finished with no pending tool call.
    Done { turns: u32, tool_calls: u32 },

    /// The chain failed. The conversation keeps whatever was appended
    /// before the failure.
    Error { message: String },
}

impl AgentStreamEvent {
    /// The wire tag, for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            AgentStreamEvent::Delta { .. } => "delta",
            AgentStreamEvent::Refusal { .. } => "refusal",
            AgentStreamEvent::ToolCall { .. } => "tool_call",
            AgentStreamEvent::ToolResult { .. } => "tool_result",
            AgentStreamEvent::Done { .. } => "done",
            AgentStreamEvent::Error { .. } => "error",
        }
    }
}

/// Where the turn runner pushes events as they happen.
///
/// Implementations must not block; the runner calls `push` from inside the
/// streaming loop.
pub trait DisplaySink: Send + Sync {
    fn push(&self, event: AgentStreamEvent);
}

/// A sink backed by an unbounded channel. Dropped receivers are ignored.
pub struct ChannelSink {
    tx: tokio::sync::mpsc::UnboundedSender<AgentStreamEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<AgentStreamEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DisplaySink for ChannelSink {
    fn push(&self, event: AgentStreamEvent) {
        let _ = self.tx.send(event);
    }
}
