//! Error types for Agent Mesh.

use thiserror::Error;

/// Result type alias using Agent Mesh's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Agent Mesh.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("Registry error: {0}")]
    Registry(String),

    // =========================================================================
    // Routing Errors (gateway)
    // =========================================================================
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Downstream agent error: {0}")]
    Agent(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // =========================================================================
    // Tool Errors (skills)
    // =========================================================================
    #[error("MCP error: {0}")]
    Mcp(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    // =========================================================================
    // Planner Errors (controller / model gateway)
    // =========================================================================
    #[error("Planner error: {0}")]
    Planner(String),

    #[error("Model provider error: {0}")]
    ModelProvider(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a registry error.
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a downstream agent error.
    pub fn agent(msg: impl Into<String>) -> Self {
        Self::Agent(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an MCP error.
    pub fn mcp(msg: impl Into<String>) -> Self {
        Self::Mcp(msg.into())
    }

    /// Create a tool not found error.
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound(name.into())
    }

    /// Create an invalid arguments error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a planner error.
    pub fn planner(msg: impl Into<String>) -> Self {
        Self::Planner(msg.into())
    }

    /// Create an unsupported operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Only transport-level failures qualify; a downstream agent that answered
    /// with an error has already made its decision.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::transport("connection refused").is_retryable());
        assert!(Error::Timeout("60s".into()).is_retryable());
        assert!(!Error::agent("bad params").is_retryable());
        assert!(!Error::unsupported("cancel").is_retryable());
    }

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            Error::unsupported("Cancel not supported").to_string(),
            "Unsupported operation: Cancel not supported"
        );
        assert_eq!(Error::mcp("down").to_string(), "MCP error: down");
    }
}
