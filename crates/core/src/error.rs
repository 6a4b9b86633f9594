//! Error types for the Kaede domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each collaborator has
//! its own error enum; the top-level `Error` wraps them all.
//!
//! Error policy by category:
//! - configuration errors are fatal at startup
//! - memory-service errors are logged and degraded to "no memory"
//! - tool errors never cross the registry boundary as errors — they are
//!   rendered to labeled text and fed back into the conversation
//! - provider transport errors propagate to the caller of the agent loop

use thiserror::Error;

/// The top-level error type for all Kaede operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Memory service error: {0}")]
    Service(String),

    #[error("Memory service unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed memory response: {0}")]
    MalformedResponse(String),

    #[error("No active session")]
    NoSession,
}

/// Tool failures that cross the `Tool::execute` boundary. Not-found,
/// blocked, and timeout outcomes are labeled `ToolResult`s instead, so the
/// model sees them as text.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
