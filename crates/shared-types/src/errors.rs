//! # Error Types
//!
//! Parse errors for the shared identifier types.

use thiserror::Error;

/// A role string was neither `teacher` nor `student`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0:?}")]
pub struct RoleParseError(pub String);

/// Errors constructing a `ConnectionId`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionIdError {
    /// Identifier was empty or whitespace only.
    #[error("Connection id cannot be empty")]
    Empty,
}
