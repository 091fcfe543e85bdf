//! Core types for workflow instance persistence
//!
//! This crate defines the data the persistence pipeline operates on:
//! - QualifiedName: namespaced identifier for one persisted value
//! - Value: payload stored under a name
//! - Visibility: `{ReadWrite, WriteOnly}` x `{Required, Optional}`
//! - ValueStore: unique-name mapping for one save or load
//! - ValueView: filtered, cached projection handed to participants
//! - Error: store and name errors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod name;
pub mod store;
pub mod value;
pub mod view;

pub use error::{Error, NameCollision, Result};
pub use name::{QualifiedName, MAX_QUALIFIED_NAME_LENGTH};
pub use store::{SharedValueStore, ValueMap, ValueStore};
pub use value::{Access, InstanceValue, Requirement, Value, Visibility};
pub use view::{ValueView, WriteBuffer};
