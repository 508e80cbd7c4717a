//! Error handling types for irodori
//!
//! Stale-generation discards are not errors and never surface here; see
//! [`crate::engine::DiscardReason`]. This module covers the failures a caller
//! may want to report: bad configuration, failed candidate production, IO.

use std::sync::PoisonError;
use thiserror::Error;

/// Comprehensive error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be parsed or is inconsistent
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// A candidate producer failed to compute ranges
    #[error("Producer error: {message}")]
    Producer { message: String },

    /// The document attachment was uninstalled
    #[error("Document is not attached: {document}")]
    Detached { document: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Helper trait for lock results whose poisoning is survivable
pub trait LockResultExt<T> {
    /// Recover the guard from a poisoned lock, logging the context.
    ///
    /// A panic on the other role must not take highlighting down with it;
    /// the range set is always left sorted between statements.
    fn recover(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "irodori::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}

/// Helper functions for common error patterns
impl EngineError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config {
            message: message.into(),
        }
    }

    /// Create a producer error
    pub fn producer(message: impl Into<String>) -> Self {
        EngineError::Producer {
            message: message.into(),
        }
    }

    /// Create a detached-document error
    pub fn detached(document: impl Into<String>) -> Self {
        EngineError::Detached {
            document: document.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal(message.into())
    }
}
