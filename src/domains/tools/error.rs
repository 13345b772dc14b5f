//! Tool-specific error types.

use thiserror::Error;

/// Errors produced while routing a tool call.
///
/// Every variant is converted into an error envelope by the dispatcher; the
/// `Display` text is exactly what the client sees.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments failed schema validation or could not be decoded.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The backing adapter reported a failure.
    #[error("Error executing {tool}: {source}")]
    ExecutionFailed {
        tool: String,
        #[source]
        source: AdapterError,
    },

    /// The handler panicked; details stay in the server log.
    #[error("Error executing {0}: internal error")]
    Panicked(String),

    /// Two tools were registered under the same name.
    #[error("Duplicate tool registration: {0}")]
    DuplicateTool(String),
}

impl ToolError {
    /// Create a new "unknown tool" error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an adapter failure for the given tool.
    pub fn execution_failed(tool: impl Into<String>, source: AdapterError) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            source,
        }
    }
}

/// Domain errors raised by backend adapters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// An outbound call (chain, price feed, completion) failed or timed out.
    #[error("{0}")]
    ExternalCallFailed(String),

    /// The requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An argument passed schema validation but is not acceptable to the domain.
    #[error("{0}")]
    InvalidArgument(String),
}

impl AdapterError {
    /// Create a new "external call failed" error.
    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalCallFailed(msg.into())
    }

    /// Create a new "not found" error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new "invalid argument" error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
