//! Unified error system for Palisade
//!
//! One error type shared by every crate in the workspace. Integrity
//! errors are fatal by contract: a malformed ACL chain or an unknown
//! persisted type code indicates corrupted authorization state and
//! must never be swallowed or turned into a silent deny.

use serde::{Deserialize, Serialize};

/// Unified error type for all Palisade operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum PalisadeError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Authorization state is corrupt (unknown type code, dangling
    /// shared-ACL pointer, inheritance cycle)
    #[error("Integrity error: {message}")]
    Integrity {
        /// Error message describing the corrupt state
        message: String,
    },

    /// Storage collaborator failure
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal failure
        message: String,
    },
}

impl PalisadeError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type alias used across the workspace
pub type PalisadeResult<T> = Result<T, PalisadeError>;
