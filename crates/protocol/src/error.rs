//! Protocol error types

use thiserror::Error;

/// Errors raised while interpreting operator-supplied identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Identifier text does not match the expected shape or range
    #[error("Invalid format: {input:?} (expected format is: {expected})")]
    InvalidFormat {
        input: String,
        expected: &'static str,
    },
}

impl ProtocolError {
    pub(crate) fn invalid(input: &str, expected: &'static str) -> Self {
        Self::InvalidFormat {
            input: input.to_string(),
            expected,
        }
    }
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
