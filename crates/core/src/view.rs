//! Filtered views over a shared value store
//!
//! A `ValueView` is what participants see of the store. It is a read filter
//! plus a write gate, not a copy:
//!
//! - The **read-write** view exposes only `ReadWrite` entries.
//! - The **write-only** view exposes only `WriteOnly` entries.
//!
//! # Snapshot Semantics
//!
//! The filtered enumeration is computed on first read and cached as an
//! immutable `Arc<BTreeMap>`. Later reads (`get`, `len`, `names`, ...) are
//! served from that snapshot even if the store has since gained entries.
//! The snapshot is only dropped by an explicit [`ValueView::reset_caches`].
//!
//! Mutating the store never invalidates the cache on its own: a participant
//! that reads a view twice within one phase sees the same contents both
//! times.
//!
//! Clones of a view share the same cache.
//!
//! # Writes
//!
//! Writes never reach the store directly. A view is read-only unless it was
//! given a [`WriteBuffer`] with [`ValueView::with_writes`] and the owner of
//! that buffer has opened it. Accepted writes wait in the buffer until the
//! owner drains it with [`WriteBuffer::close`] and commits them itself.

use crate::error::{Error, Result};
use crate::name::QualifiedName;
use crate::store::{SharedValueStore, ValueMap};
use crate::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Write window shared by the views of one pipeline
///
/// Closed by default. Clones share the same window.
#[derive(Clone, Default)]
pub struct WriteBuffer {
    slot: Arc<Mutex<Option<Vec<(QualifiedName, Value)>>>>,
}

impl WriteBuffer {
    /// Create a closed buffer
    pub fn new() -> Self {
        WriteBuffer::default()
    }

    /// Start accepting writes, discarding anything left from a previous window
    pub fn open(&self) {
        *self.slot.lock() = Some(Vec::new());
    }

    /// Stop accepting writes and return those accepted, in write order
    pub fn close(&self) -> Vec<(QualifiedName, Value)> {
        self.slot.lock().take().unwrap_or_default()
    }

    /// Whether writes are currently accepted
    pub fn is_open(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl fmt::Debug for WriteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("WriteBuffer")
            .field("open", &slot.is_some())
            .field("pending", &slot.as_ref().map_or(0, Vec::len))
            .finish()
    }
}

/// Filtered, lazily cached projection over a [`SharedValueStore`]
#[derive(Clone)]
pub struct ValueView {
    store: SharedValueStore,
    write_only: bool,
    cache: Arc<Mutex<Option<Arc<ValueMap>>>>,
    writes: WriteBuffer,
}

impl ValueView {
    /// View exposing only read-write entries
    pub fn read_write(store: SharedValueStore) -> Self {
        Self::new(store, false)
    }

    /// View exposing only write-only entries
    pub fn write_only(store: SharedValueStore) -> Self {
        Self::new(store, true)
    }

    fn new(store: SharedValueStore, write_only: bool) -> Self {
        ValueView {
            store,
            write_only,
            cache: Arc::new(Mutex::new(None)),
            writes: WriteBuffer::new(),
        }
    }

    /// Route writes through `writes` instead of refusing them
    pub fn with_writes(mut self, writes: WriteBuffer) -> Self {
        self.writes = writes;
        self
    }

    /// Whether this view exposes write-only entries
    pub fn is_write_only(&self) -> bool {
        self.write_only
    }

    /// The cached filtered contents, computing them if needed
    pub fn snapshot(&self) -> Arc<ValueMap> {
        let mut cache = self.cache.lock();
        if let Some(snapshot) = cache.as_ref() {
            return Arc::clone(snapshot);
        }
        let snapshot = Arc::new(self.store.read().filtered(self.write_only));
        *cache = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Drop the cached snapshot so the next read sees the current store
    pub fn reset_caches(&self) {
        *self.cache.lock() = None;
    }

    /// Whether a snapshot is currently cached
    pub fn is_cached(&self) -> bool {
        self.cache.lock().is_some()
    }

    /// Get a value by name
    pub fn get(&self, name: &QualifiedName) -> Option<Value> {
        self.snapshot().get(name).cloned()
    }

    /// Check if a name is visible through this view
    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.snapshot().contains_key(name)
    }

    /// Number of visible entries
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Check if no entries are visible
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Visible names in order
    pub fn names(&self) -> Vec<QualifiedName> {
        self.snapshot().keys().cloned().collect()
    }

    /// Visible `(name, value)` pairs in order
    pub fn entries(&self) -> Vec<(QualifiedName, Value)> {
        self.snapshot()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Contribute a value through the view
    ///
    /// The value is buffered, not stored. Whoever opened the buffer commits
    /// it as `{WriteOnly, Optional}` regardless of which view it was written
    /// through. The cached snapshot is not touched.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReadOnlyView` if the buffer is closed, or
    /// `Error::NameCollision` if the name is already in the store or was
    /// already written in this window.
    pub fn insert(&self, name: QualifiedName, value: Value) -> Result<()> {
        let mut slot = self.writes.slot.lock();
        let buffered = slot.as_mut().ok_or(Error::ReadOnlyView)?;
        if buffered.iter().any(|(n, _)| *n == name) || self.store.read().contains(&name) {
            return Err(Error::NameCollision { name });
        }
        buffered.push((name, value));
        Ok(())
    }
}

impl fmt::Debug for ValueView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueView")
            .field("write_only", &self.write_only)
            .field("cached", &self.is_cached())
            .field("writable", &self.writes.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ValueStore;
    use crate::value::Visibility;

    fn qn(s: &str) -> QualifiedName {
        QualifiedName::parse(s).unwrap()
    }

    fn seeded() -> SharedValueStore {
        let mut store = ValueStore::new();
        store
            .insert(qn("rw1"), Value::Int(1), Visibility::READ_WRITE)
            .unwrap();
        store
            .insert(qn("rw2"), Value::Int(2), Visibility::READ_WRITE)
            .unwrap();
        store
            .insert(qn("wo1"), Value::Int(3), Visibility::WRITE_ONLY)
            .unwrap();
        store.into_shared()
    }

    #[test]
    fn test_views_filter_by_access() {
        let store = seeded();
        let rw = ValueView::read_write(store.clone());
        let wo = ValueView::write_only(store);

        assert_eq!(rw.names(), vec![qn("rw1"), qn("rw2")]);
        assert_eq!(wo.names(), vec![qn("wo1")]);
        assert!(rw.get(&qn("wo1")).is_none());
        assert!(wo.get(&qn("rw1")).is_none());
        assert!(!rw.is_write_only());
        assert!(wo.is_write_only());
    }

    #[test]
    fn test_snapshot_is_lazy() {
        let store = seeded();
        let wo = ValueView::write_only(store.clone());
        assert!(!wo.is_cached());

        store
            .write()
            .insert(qn("wo2"), Value::Null, Visibility::WRITE_ONLY)
            .unwrap();

        // First read happens after the insert, so it is included
        assert_eq!(wo.len(), 2);
        assert!(wo.is_cached());
    }

    #[test]
    fn test_cache_is_stable_until_reset() {
        let store = seeded();
        let wo = ValueView::write_only(store.clone());
        assert_eq!(wo.len(), 1);

        store
            .write()
            .insert(qn("mapped"), Value::from("m"), Visibility::WRITE_ONLY)
            .unwrap();

        assert_eq!(wo.len(), 1);
        assert!(!wo.contains(&qn("mapped")));

        wo.reset_caches();
        assert_eq!(wo.len(), 2);
        assert_eq!(wo.get(&qn("mapped")), Some(Value::from("m")));
    }

    #[test]
    fn test_clones_share_cache() {
        let store = seeded();
        let wo = ValueView::write_only(store.clone());
        let copy = wo.clone();
        assert_eq!(copy.len(), 1);

        store
            .write()
            .insert(qn("late"), Value::Null, Visibility::WRITE_ONLY)
            .unwrap();
        assert_eq!(copy.len(), 1);

        wo.reset_caches();
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn test_insert_refused_without_open_buffer() {
        let store = seeded();
        let rw = ValueView::read_write(store.clone());
        assert_eq!(
            rw.insert(qn("derived"), Value::Int(9)),
            Err(Error::ReadOnlyView)
        );

        let writes = WriteBuffer::new();
        let wo = ValueView::write_only(store.clone()).with_writes(writes.clone());
        assert_eq!(wo.insert(qn("derived"), Value::Int(9)), Err(Error::ReadOnlyView));
        assert_eq!(store.read().len(), 3);
    }

    #[test]
    fn test_insert_is_buffered_until_drained() {
        let store = seeded();
        let writes = WriteBuffer::new();
        let rw = ValueView::read_write(store.clone()).with_writes(writes.clone());
        let wo = ValueView::write_only(store.clone()).with_writes(writes.clone());

        writes.open();
        rw.insert(qn("b"), Value::Int(1)).unwrap();
        wo.insert(qn("a"), Value::Int(2)).unwrap();

        // Nothing reaches the store while buffered
        assert_eq!(store.read().len(), 3);
        assert!(!wo.contains(&qn("a")));

        let drained = writes.close();
        assert_eq!(
            drained,
            vec![(qn("b"), Value::Int(1)), (qn("a"), Value::Int(2))]
        );
        assert!(!writes.is_open());
        assert_eq!(rw.insert(qn("c"), Value::Null), Err(Error::ReadOnlyView));
    }

    #[test]
    fn test_insert_through_view_collides() {
        let store = seeded();
        let writes = WriteBuffer::new();
        let rw = ValueView::read_write(store.clone()).with_writes(writes.clone());
        writes.open();

        let err = rw.insert(qn("rw1"), Value::Int(100)).unwrap_err();
        assert_eq!(err, Error::NameCollision { name: qn("rw1") });

        rw.insert(qn("fresh"), Value::Int(1)).unwrap();
        let err = rw.insert(qn("fresh"), Value::Int(2)).unwrap_err();
        assert_eq!(err, Error::NameCollision { name: qn("fresh") });

        assert_eq!(writes.close(), vec![(qn("fresh"), Value::Int(1))]);
        assert_eq!(store.read().get(&qn("rw1")).unwrap().value, Value::Int(1));
    }

    #[test]
    fn test_reopen_discards_stale_writes() {
        let writes = WriteBuffer::new();
        let rw = ValueView::read_write(seeded()).with_writes(writes.clone());
        writes.open();
        rw.insert(qn("stale"), Value::Null).unwrap();
        writes.open();
        assert!(writes.close().is_empty());
    }

    #[test]
    fn test_entries_in_order() {
        let rw = ValueView::read_write(seeded());
        assert_eq!(
            rw.entries(),
            vec![(qn("rw1"), Value::Int(1)), (qn("rw2"), Value::Int(2))]
        );
    }
}
