//! Value store for one persistence operation
//!
//! A `ValueStore` holds every named value produced (on save) or restored
//! (on load) for a single workflow instance. It is created by the caller for
//! one pipeline invocation and handed to the backend, or discarded, once the
//! invocation completes.
//!
//! # Invariants
//!
//! - Names are unique. A second insertion under a taken name fails with
//!   [`NameCollision`] and leaves the store untouched.
//! - Iteration is in `QualifiedName` order.
//!
//! The pipeline and its views share the store through [`SharedValueStore`].
//! The lock is never held across a participant call.

use crate::error::NameCollision;
use crate::name::QualifiedName;
use crate::value::{InstanceValue, Value, Visibility};
use parking_lot::RwLock;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle to a store shared between a pipeline, its views and the caller
pub type SharedValueStore = Arc<RwLock<ValueStore>>;

/// Plain name-to-value mapping contributed or returned by participants
pub type ValueMap = BTreeMap<QualifiedName, Value>;

/// Mapping from qualified name to value plus visibility
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueStore {
    entries: BTreeMap<QualifiedName, InstanceValue>,
}

impl ValueStore {
    /// Create an empty store
    pub fn new() -> Self {
        ValueStore::default()
    }

    /// Seed a store with values restored by the backend
    ///
    /// Only read-write values are ever restored, so every entry is tagged
    /// `{ReadWrite, Required}`.
    pub fn from_loaded(values: ValueMap) -> Self {
        ValueStore {
            entries: values
                .into_iter()
                .map(|(name, value)| (name, InstanceValue::read_write(value)))
                .collect(),
        }
    }

    /// Wrap this store for sharing with a pipeline
    pub fn into_shared(self) -> SharedValueStore {
        Arc::new(RwLock::new(self))
    }

    /// Insert a value under a name that must not already be present
    ///
    /// # Errors
    ///
    /// Returns `NameCollision` if `name` is taken. The existing entry is
    /// left as it was.
    pub fn insert(
        &mut self,
        name: QualifiedName,
        value: Value,
        visibility: Visibility,
    ) -> Result<(), NameCollision> {
        match self.entries.entry(name) {
            Entry::Occupied(occupied) => Err(NameCollision {
                name: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(InstanceValue::new(value, visibility));
                Ok(())
            }
        }
    }

    /// Get the entry stored under a name
    pub fn get(&self, name: &QualifiedName) -> Option<&InstanceValue> {
        self.entries.get(name)
    }

    /// Check if a name is present
    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove and return the entry stored under a name
    pub fn remove(&mut self, name: &QualifiedName) -> Option<InstanceValue> {
        self.entries.remove(name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&QualifiedName, &InstanceValue)> {
        self.entries.iter()
    }

    /// Values whose access class matches `write_only`, in name order
    pub fn filtered(&self, write_only: bool) -> ValueMap {
        self.entries
            .iter()
            .filter(|(_, v)| v.visibility.is_write_only() == write_only)
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }

    /// Consume the store, yielding its entries for the backend
    pub fn into_values(self) -> BTreeMap<QualifiedName, InstanceValue> {
        self.entries
    }
}
