//! Error types for the PanePilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all PanePilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Pane errors ---
    #[error("Pane error: {0}")]
    Pane(#[from] PaneError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A tool-call chain kept requesting continuation turns past the
    /// configured bound. Fails closed rather than looping forever.
    #[error("Tool-call chain exceeded the maximum depth of {max_depth}")]
    ChainDepthExceeded { max_depth: u32 },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from the mediated terminal pane.
#[derive(Debug, Clone, Error)]
pub enum PaneError {
    /// No ambient multiplexer session was detected. Fatal at startup.
    #[error("No terminal multiplexer detected: {0}")]
    Environment(String),

    /// An operation was attempted after the pane was torn down.
    #[error("Pane session is closed")]
    Closed,

    /// A multiplexer command failed.
    #[error("Multiplexer command failed: {action} — {reason}")]
    Command { action: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
