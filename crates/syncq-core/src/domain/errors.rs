//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly parse and validation failures for identifiers and enums.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Item identifiers must not be empty
    #[error("Invalid item ID: {0}")]
    InvalidId(String),

    /// Unknown priority name
    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    /// Unknown item kind label
    #[error("Invalid item kind: {0}")]
    InvalidKind(String),
}
