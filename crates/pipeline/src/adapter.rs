//! Participant adapter
//!
//! Normalizes the legacy and capability-interface participant shapes into
//! one call surface, so the pipeline never branches on which shape an
//! extension implements.
//!
//! ## Resolution
//!
//! An adapter probes its extension exactly once, at construction:
//!
//! 1. Legacy shape first. If present, `is_io_participant` decides whether
//!    the I/O calls are forwarded.
//! 2. Otherwise the values and I/O capabilities are probed independently.
//!
//! The outcome is a [`ParticipantKind`] and a [`Capabilities`] set. Calls
//! for a capability the participant lacks resolve immediately with nothing
//! contributed and no error.

use crate::participant::{
    CollectedValues, LegacyPersistenceParticipant, ParticipantResult, PersistenceExtension,
    PersistenceIoParticipant, PersistenceParticipant,
};
use instate_core::{ValueMap, ValueView};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Which participant shape an extension resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantKind {
    /// Base-class style participant
    Legacy,
    /// One or both capability interfaces
    Modern,
    /// Neither shape; every call is a no-op
    Inert,
}

/// Capabilities an adapter forwards to its participant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// Collect, map and publish
    pub values: bool,
    /// Save, load and abort (and saved, for the modern shape)
    pub io: bool,
}

enum Shape {
    Legacy {
        participant: Arc<dyn LegacyPersistenceParticipant>,
        io: bool,
    },
    Modern {
        values: Option<Arc<dyn PersistenceParticipant>>,
        io: Option<Arc<dyn PersistenceIoParticipant>>,
    },
}

/// Uniform call surface over one participant
pub struct ParticipantAdapter {
    name: String,
    shape: Shape,
}

impl ParticipantAdapter {
    /// Resolve an extension into an adapter
    pub fn new(extension: Arc<dyn PersistenceExtension>) -> Self {
        let name = extension.name().to_string();
        if let Some(participant) = Arc::clone(&extension).as_legacy_participant() {
            return Self::legacy(name, participant);
        }
        let values = Arc::clone(&extension).as_persistence_participant();
        let io = extension.as_io_participant();
        Self::modern(name, values, io)
    }

    /// Adapter over a legacy participant
    pub fn legacy(
        name: impl Into<String>,
        participant: Arc<dyn LegacyPersistenceParticipant>,
    ) -> Self {
        let io = participant.is_io_participant();
        ParticipantAdapter {
            name: name.into(),
            shape: Shape::Legacy { participant, io },
        }
    }

    /// Adapter over capability interfaces
    pub fn modern(
        name: impl Into<String>,
        values: Option<Arc<dyn PersistenceParticipant>>,
        io: Option<Arc<dyn PersistenceIoParticipant>>,
    ) -> Self {
        ParticipantAdapter {
            name: name.into(),
            shape: Shape::Modern { values, io },
        }
    }

    /// Identity used in errors and logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved shape
    pub fn kind(&self) -> ParticipantKind {
        match &self.shape {
            Shape::Legacy { .. } => ParticipantKind::Legacy,
            Shape::Modern {
                values: None,
                io: None,
            } => ParticipantKind::Inert,
            Shape::Modern { .. } => ParticipantKind::Modern,
        }
    }

    /// The capabilities calls are forwarded for
    pub fn capabilities(&self) -> Capabilities {
        match &self.shape {
            Shape::Legacy { io, .. } => Capabilities {
                values: true,
                io: *io,
            },
            Shape::Modern { values, io } => Capabilities {
                values: values.is_some(),
                io: io.is_some(),
            },
        }
    }

    /// Whether saving through this participant requires a transaction
    pub fn is_save_transaction_required(&self) -> bool {
        match &self.shape {
            Shape::Legacy { participant, .. } => participant.is_save_transaction_required(),
            Shape::Modern { .. } => false,
        }
    }

    /// Whether loading through this participant requires a transaction
    pub fn is_load_transaction_required(&self) -> bool {
        match &self.shape {
            Shape::Legacy { participant, .. } => participant.is_load_transaction_required(),
            Shape::Modern { .. } => false,
        }
    }

    /// Values to insert during Collect
    pub fn collect(&self) -> CollectedValues {
        match &self.shape {
            Shape::Legacy { participant, .. } => {
                let (read_write, write_only) = participant.collect_values();
                CollectedValues::new(
                    read_write.unwrap_or_default(),
                    write_only.unwrap_or_default(),
                )
            }
            Shape::Modern {
                values: Some(values),
                ..
            } => values.collect_values(),
            Shape::Modern { values: None, .. } => CollectedValues::default(),
        }
    }

    /// Values to insert during Map
    pub fn map(&self, read_write: &ValueView, write_only: &ValueView) -> Option<ValueMap> {
        match &self.shape {
            Shape::Legacy { participant, .. } => participant.map_values(read_write, write_only),
            Shape::Modern {
                values: Some(values),
                ..
            } => values.map_values(read_write, write_only),
            Shape::Modern { values: None, .. } => None,
        }
    }

    /// Forward the Save call
    pub async fn on_save(
        &self,
        read_write: &ValueView,
        write_only: &ValueView,
        timeout: Duration,
    ) -> ParticipantResult {
        match &self.shape {
            Shape::Legacy {
                participant,
                io: true,
            } => participant.on_save(read_write, write_only, timeout).await,
            Shape::Modern { io: Some(io), .. } => {
                io.on_save(read_write, write_only, timeout).await
            }
            _ => Ok(()),
        }
    }

    /// Forward the Saved call; the legacy shape has no equivalent
    pub async fn on_saved(&self, timeout: Duration) -> ParticipantResult {
        match &self.shape {
            Shape::Modern { io: Some(io), .. } => io.on_saved(timeout).await,
            _ => Ok(()),
        }
    }

    /// Forward the Load call
    pub async fn on_load(&self, read_write: &ValueView, timeout: Duration) -> ParticipantResult {
        match &self.shape {
            Shape::Legacy {
                participant,
                io: true,
            } => participant.on_load(read_write, timeout).await,
            Shape::Modern { io: Some(io), .. } => io.on_load(read_write, timeout).await,
            _ => Ok(()),
        }
    }

    /// Forward the Publish call
    pub fn publish(&self, read_write: &ValueView) {
        match &self.shape {
            Shape::Legacy { participant, .. } => participant.publish_values(read_write),
            Shape::Modern {
                values: Some(values),
                ..
            } => values.publish_values(read_write),
            Shape::Modern { values: None, .. } => {}
        }
    }

    /// Forward the Abort call
    pub fn abort(&self) -> ParticipantResult {
        match &self.shape {
            Shape::Legacy {
                participant,
                io: true,
            } => participant.abort(),
            Shape::Modern { io: Some(io), .. } => io.abort(),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for ParticipantAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantAdapter")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
