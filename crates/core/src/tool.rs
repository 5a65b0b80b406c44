//! Tool call domain type.
//!
//! A `ToolCall` is produced mid-stream by the model and consumed exactly
//! once by the dispatcher. Its `id` must reappear on the resulting tool
//! message so the model can correlate the answer.

use serde::{Deserialize, Serialize};

/// A completed request from the model to execute a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque correlation token (matches the provider's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a raw JSON string, accumulated from stream deltas.
    /// Decoding happens at the dispatch boundary.
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_serialization_roundtrip() {
        let call = ToolCall {
            id: "call_abc".into(),
            name: "checkCommand".into(),
            arguments: r#"{"cmd":"htop"}"#.into(),
        };
        let json = serde_json::to_string(&call).unwrap();
        let parsed: ToolCall = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, call);
    }
}
