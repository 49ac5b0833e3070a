//! Error types for indexcheck
//!
//! These are *usage* errors: mistakes in how an assertion was declared or
//! configured, or raw batch operations the capture cannot interpret. They are
//! returned immediately as `Err` and never folded into a pass/fail verdict.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::Category;
use thiserror::Error;

/// Result type alias for indexcheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for indexcheck
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// `only()` was called before any document declaration
    #[error("Use `only` in conjunction with `and_reindex`, `and_update` or `and_delete`")]
    OnlyWithoutDeclarations,

    /// An option was passed to a declaration that does not understand it
    #[error("`{option}` cannot be used with `and_{category}`")]
    UnsupportedOption {
        /// Option name as written in the chain
        option: &'static str,
        /// Declaration category that rejected it
        category: Category,
    },

    /// Expected attributes must be a JSON object
    #[error("`{option}` expects a JSON object, got {found}")]
    AttributesNotAMap {
        /// Option name as written in the chain
        option: &'static str,
        /// Compact rendering of the rejected value
        found: String,
    },

    /// A raw bulk operation did not have a recognizable shape
    #[error("Malformed bulk operation: {0}")]
    MalformedOperation(String),

    /// Configuration could not be parsed or holds an invalid value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a malformed-operation error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedOperation(msg.into())
    }

    /// Create an invalid-configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Check whether this error was caused by the assertion declaration itself
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::OnlyWithoutDeclarations
                | Error::UnsupportedOption { .. }
                | Error::AttributesNotAMap { .. }
        )
    }
}
