//! Participant contracts
//!
//! Extensions take part in persistence through one of two shapes:
//!
//! - **Legacy**: [`LegacyPersistenceParticipant`], a single trait whose every
//!   method has a no-op default. A legacy participant opts in to the
//!   asynchronous I/O calls with [`LegacyPersistenceParticipant::is_io_participant`].
//!   It has no `on_saved` notification.
//! - **Capability interfaces**: [`PersistenceParticipant`] (collect, map,
//!   publish) and [`PersistenceIoParticipant`] (save, saved, load, abort),
//!   implemented independently.
//!
//! The object handed to the pipeline is a [`PersistenceExtension`]. It
//! advertises which shapes it implements through the `as_*` probes; the
//! pipeline calls each probe once, when it builds the participant's adapter.
//!
//! ## Example
//!
//! ```ignore
//! struct Counter { /* ... */ }
//!
//! impl PersistenceParticipant for Counter {
//!     fn collect_values(&self) -> CollectedValues { /* ... */ }
//! }
//!
//! impl PersistenceExtension for Counter {
//!     fn as_persistence_participant(self: Arc<Self>) -> Option<Arc<dyn PersistenceParticipant>> {
//!         Some(self)
//!     }
//! }
//! ```

use async_trait::async_trait;
use instate_core::{ValueMap, ValueView};
use std::sync::Arc;
use std::time::Duration;

/// Error returned by a participant's asynchronous call
///
/// The pipeline hands it back to the caller unchanged.
pub type ParticipantError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a participant's asynchronous call
pub type ParticipantResult = std::result::Result<(), ParticipantError>;

/// Values contributed by a participant during Collect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedValues {
    /// Values persisted and restored on load
    pub read_write: ValueMap,
    /// Values persisted but never restored
    pub write_only: ValueMap,
}

impl CollectedValues {
    /// Create collected values from both maps
    pub fn new(read_write: ValueMap, write_only: ValueMap) -> Self {
        CollectedValues {
            read_write,
            write_only,
        }
    }

    /// Only read-write values
    pub fn read_write(read_write: ValueMap) -> Self {
        Self::new(read_write, ValueMap::new())
    }

    /// Check if nothing was contributed
    pub fn is_empty(&self) -> bool {
        self.read_write.is_empty() && self.write_only.is_empty()
    }
}

/// Base-class style participant
///
/// All methods default to doing nothing. The asynchronous methods are only
/// invoked when [`is_io_participant`](Self::is_io_participant) returns true.
#[async_trait]
pub trait LegacyPersistenceParticipant: Send + Sync {
    /// Whether `on_save`, `on_load` and `abort` should be called
    fn is_io_participant(&self) -> bool {
        false
    }

    /// Whether saving requires an ambient transaction
    fn is_save_transaction_required(&self) -> bool {
        false
    }

    /// Whether loading requires an ambient transaction
    fn is_load_transaction_required(&self) -> bool {
        false
    }

    /// Return `(read_write, write_only)` values to persist
    fn collect_values(&self) -> (Option<ValueMap>, Option<ValueMap>) {
        (None, None)
    }

    /// Derive additional write-only values from the collected ones
    fn map_values(&self, _read_write: &ValueView, _write_only: &ValueView) -> Option<ValueMap> {
        None
    }

    /// Receive the read-write values after a load
    fn publish_values(&self, _read_write: &ValueView) {}

    /// Perform this participant's own I/O for a save
    async fn on_save(
        &self,
        _read_write: &ValueView,
        _write_only: &ValueView,
        _timeout: Duration,
    ) -> ParticipantResult {
        Ok(())
    }

    /// Perform this participant's own I/O for a load
    async fn on_load(&self, _read_write: &ValueView, _timeout: Duration) -> ParticipantResult {
        Ok(())
    }

    /// Discard any work started by `on_save` or `on_load`
    fn abort(&self) -> ParticipantResult {
        Ok(())
    }
}

/// Synchronous values capability
pub trait PersistenceParticipant: Send + Sync {
    /// Return values to persist
    fn collect_values(&self) -> CollectedValues;

    /// Derive additional write-only values from the collected ones
    ///
    /// Only values present before Map started are visible here; values
    /// mapped by other participants in the same pass are not. Values may
    /// also be written through either view, but only during this call.
    fn map_values(&self, read_write: &ValueView, write_only: &ValueView) -> Option<ValueMap>;

    /// Receive the read-write values after a load
    ///
    /// The view is read-only here.
    fn publish_values(&self, read_write: &ValueView);
}

/// Asynchronous I/O capability
#[async_trait]
pub trait PersistenceIoParticipant: Send + Sync {
    /// Perform this participant's own I/O for a save
    async fn on_save(
        &self,
        read_write: &ValueView,
        write_only: &ValueView,
        timeout: Duration,
    ) -> ParticipantResult;

    /// Notification that the backend committed the save
    async fn on_saved(&self, timeout: Duration) -> ParticipantResult;

    /// Perform this participant's own I/O for a load
    async fn on_load(&self, read_write: &ValueView, timeout: Duration) -> ParticipantResult;

    /// Discard any work started by an earlier asynchronous call
    fn abort(&self) -> ParticipantResult;
}

/// An extension object handed to the pipeline
///
/// Every probe defaults to `None`. An extension overrides the probes for
/// the shapes it implements, typically with `Some(self)`. The legacy probe
/// wins when it returns `Some`.
pub trait PersistenceExtension: Send + Sync {
    /// Identity used in errors and logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Legacy participant shape
    fn as_legacy_participant(self: Arc<Self>) -> Option<Arc<dyn LegacyPersistenceParticipant>> {
        None
    }

    /// Values capability
    fn as_persistence_participant(self: Arc<Self>) -> Option<Arc<dyn PersistenceParticipant>> {
        None
    }

    /// Asynchronous I/O capability
    fn as_io_participant(self: Arc<Self>) -> Option<Arc<dyn PersistenceIoParticipant>> {
        None
    }
}
