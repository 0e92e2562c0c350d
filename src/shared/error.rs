//! Core Error Types
//!
//! Error taxonomy for the synchronization core. Every failure is local to one
//! entity's cache slice; nothing here is fatal to the process.
//!
//! # Error Categories
//!
//! - `Validation` - rejected before any network call (empty name, etc.)
//! - `Authorization` - insufficient role; surfaced, never fatal
//! - `Network` - request failed or timed out
//! - `NotFound` - entity vanished server-side
//! - `Serialization` - response body could not be decoded
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across thread
//! boundaries.

use thiserror::Error;

/// Result alias used throughout the synchronization core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error type for all cache and transport operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input rejected before any network call was made
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Action attempted without a sufficient role
    #[error("Authorization error: {message}")]
    Authorization {
        /// Human-readable error message
        message: String,
    },

    /// Request failed or timed out
    #[error("Network error: {message}")]
    Network {
        /// Human-readable error message
        message: String,
    },

    /// Entity no longer exists server-side
    #[error("Not found: {entity}")]
    NotFound {
        /// What kind of entity vanished (board, task, member)
        entity: String,
    },

    /// Response body could not be decoded
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },
}

impl CoreError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether the failure means the entity is gone and the parent
    /// collection should be refetched
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::serialization(format!("Failed to parse response: {}", err))
        } else {
            Self::network(format!("{}", err))
        }
    }
}
