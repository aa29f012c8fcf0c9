//! Unified error system for Vesper
//!
//! One error type for every fallible operation that crosses a crate
//! boundary. Effect-specific errors convert into it.

use crate::effects::{AdError, ReviewError, StorageError, TimeError};
use serde::{Deserialize, Serialize};

/// Unified error type for all Vesper operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VesperError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Durable state store failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Ad network adapter failed or is absent
    #[error("Ad network error: {message}")]
    Ads {
        /// Error message describing the ad network failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl VesperError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an ad network error
    pub fn ads(message: impl Into<String>) -> Self {
        Self::Ads {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
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

/// Standard Result type for Vesper operations
pub type Result<T> = std::result::Result<T, VesperError>;

impl From<StorageError> for VesperError {
    fn from(err: StorageError) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<TimeError> for VesperError {
    fn from(err: TimeError) -> Self {
        Self::internal(format!("time error: {err}"))
    }
}

impl From<AdError> for VesperError {
    fn from(err: AdError) -> Self {
        Self::ads(err.to_string())
    }
}

impl From<ReviewError> for VesperError {
    fn from(err: ReviewError) -> Self {
        Self::internal(format!("store review error: {err}"))
    }
}

impl From<toml::de::Error> for VesperError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for VesperError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}
