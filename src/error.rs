//! Engine error types.

use thiserror::Error;

/// Errors surfaced by creation, configuration, and lookup operations.
///
/// Stepping itself never fails once the engine is running; degenerate
/// geometry met during a step is skipped and logged instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// A value was rejected at the call that introduced it.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The referenced body, vertex, or constraint does not exist.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// The engine cannot accept this call in its current state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
