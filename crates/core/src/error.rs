//! Error types for the value store
//!
//! This module defines the errors raised by the store and its views.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::name::QualifiedName;
use thiserror::Error;

/// Result type alias for value store operations
pub type Result<T> = std::result::Result<T, Error>;

/// A value is already stored under this name
///
/// The only way [`ValueStore::insert`](crate::ValueStore::insert) can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Name collision on key '{name}'")]
pub struct NameCollision {
    /// The name that was already taken
    pub name: QualifiedName,
}

/// Error types for the value store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A value is already stored under this name
    #[error("Name collision on key '{name}'")]
    NameCollision {
        /// The name that was already taken
        name: QualifiedName,
    },

    /// A qualified name failed validation
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        /// The offending name as written
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// A view was written to outside the window its owner opened for writes
    #[error("View is read-only")]
    ReadOnlyView,
}

impl From<NameCollision> for Error {
    fn from(err: NameCollision) -> Self {
        Error::NameCollision { name: err.name }
    }
}
