//! Persistence pipeline orchestrator
//!
//! Drives an ordered list of participants through the persistence phases
//! for one save or one load of a workflow instance.
//!
//! ## Save path
//!
//! ```text
//! collect() -> map() -> on_save(timeout) -> [backend commit] -> on_saved(timeout)
//! ```
//!
//! ## Load path
//!
//! ```text
//! [backend read] -> on_load(timeout) -> publish()
//! ```
//!
//! ## Ordering
//!
//! Within every phase participants are called one at a time, in the order
//! the caller supplied them. Asynchronous phases await each participant
//! before moving on to the next; nothing runs concurrently.
//!
//! ## Failure containment
//!
//! When a participant fails (or times out) in Save, Saved or Load, every
//! participant is aborted in list order, including ones that were never
//! reached. Errors returned by `abort` are discarded. The original failure
//! is then returned unchanged.
//!
//! ## View writes
//!
//! Both views share one write buffer that is open only while a participant
//! is inside `map_values`. Writes made there are committed together with
//! that participant's returned mapping. In every other phase, including
//! Load and Publish, writes through a view are refused.
//!
//! ## Timeouts
//!
//! Each participant call in an asynchronous phase is given the full phase
//! timeout. The budget is not divided between participants.
//!
//! Async phases use `tokio::time` and must run inside a Tokio runtime with
//! the time driver enabled.

use crate::adapter::ParticipantAdapter;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::participant::{ParticipantResult, PersistenceExtension};
use crate::phase::{Phase, PipelineMode};
use instate_core::{
    NameCollision, QualifiedName, SharedValueStore, Value, ValueView, Visibility, WriteBuffer,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::error::Elapsed;
use tracing::{debug, info, warn};

/// Orchestrates participants over a shared value store
pub struct PersistencePipeline {
    participants: Vec<ParticipantAdapter>,
    store: SharedValueStore,
    mode: PipelineMode,
    read_write_view: ValueView,
    write_only_view: Option<ValueView>,
    writes: WriteBuffer,
}

impl PersistencePipeline {
    /// Create a save pipeline
    ///
    /// Collected write-only values are kept only when
    /// `persist_write_only_values` is set; mapped values are always kept.
    pub fn for_save(
        extensions: Vec<Arc<dyn PersistenceExtension>>,
        store: SharedValueStore,
        persist_write_only_values: bool,
    ) -> Self {
        let participants = extensions.into_iter().map(ParticipantAdapter::new).collect();
        Self::with_adapters(
            participants,
            store,
            PipelineMode::Save {
                persist_write_only_values,
            },
        )
    }

    /// Create a load pipeline
    ///
    /// A load pipeline has no write-only view.
    pub fn for_load(extensions: Vec<Arc<dyn PersistenceExtension>>, store: SharedValueStore) -> Self {
        let participants = extensions.into_iter().map(ParticipantAdapter::new).collect();
        Self::with_adapters(participants, store, PipelineMode::Load)
    }

    /// Create a save pipeline using `config.persist_write_only_values`
    pub fn save_from_config(
        extensions: Vec<Arc<dyn PersistenceExtension>>,
        store: SharedValueStore,
        config: &PipelineConfig,
    ) -> Self {
        Self::for_save(extensions, store, config.persist_write_only_values)
    }

    /// Create a pipeline over already-resolved adapters
    pub fn with_adapters(
        participants: Vec<ParticipantAdapter>,
        store: SharedValueStore,
        mode: PipelineMode,
    ) -> Self {
        let writes = WriteBuffer::new();
        let read_write_view = ValueView::read_write(store.clone()).with_writes(writes.clone());
        let write_only_view = match mode {
            PipelineMode::Save { .. } => {
                Some(ValueView::write_only(store.clone()).with_writes(writes.clone()))
            }
            PipelineMode::Load => None,
        };
        info!(
            mode = %mode,
            participants = participants.len(),
            "Created persistence pipeline"
        );
        PersistencePipeline {
            participants,
            store,
            mode,
            read_write_view,
            write_only_view,
            writes,
        }
    }

    /// How this pipeline was constructed
    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// The resolved participants, in call order
    pub fn participants(&self) -> &[ParticipantAdapter] {
        &self.participants
    }

    /// The store this pipeline fills or reads
    pub fn store(&self) -> &SharedValueStore {
        &self.store
    }

    /// The standing read-write view
    pub fn read_write_view(&self) -> &ValueView {
        &self.read_write_view
    }

    /// The standing write-only view
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::WriteOnlyViewUnavailable` on a load pipeline.
    pub fn write_only_view(&self) -> Result<&ValueView> {
        self.write_only_view
            .as_ref()
            .ok_or(PipelineError::WriteOnlyViewUnavailable)
    }

    /// Whether any participant requires a transaction around the save
    pub fn save_transaction_required(&self) -> bool {
        self.participants
            .iter()
            .any(ParticipantAdapter::is_save_transaction_required)
    }

    /// Whether any participant requires a transaction around the load
    pub fn load_transaction_required(&self) -> bool {
        self.participants
            .iter()
            .any(ParticipantAdapter::is_load_transaction_required)
    }

    /// Gather values from every participant into the store
    ///
    /// Read-write values are stored `{ReadWrite, Required}`. Write-only
    /// values are stored `{WriteOnly, Optional}` when the pipeline persists
    /// them and dropped otherwise. Both views are reset afterwards, so reads
    /// made before Collect do not hide the collected values.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NameCollision` on the first name already in
    /// the store, or `PipelineError::InvalidPhase` on a load pipeline.
    pub fn collect(&self) -> Result<()> {
        let (read_write, write_only) = self.save_views(Phase::Collect)?;
        let persist_write_only = self.mode.persist_write_only_values();
        debug!(phase = %Phase::Collect, "Phase started");

        let inserted = self.participants.iter().try_for_each(|participant| -> Result<()> {
            let collected = participant.collect();
            debug!(
                participant = participant.name(),
                read_write = collected.read_write.len(),
                write_only = collected.write_only.len(),
                "Collected values"
            );
            self.insert_all(
                participant,
                Phase::Collect,
                collected.read_write,
                Visibility::READ_WRITE,
            )?;
            if persist_write_only {
                self.insert_all(
                    participant,
                    Phase::Collect,
                    collected.write_only,
                    Visibility::WRITE_ONLY,
                )?;
            }
            Ok(())
        });

        read_write.reset_caches();
        write_only.reset_caches();
        inserted?;
        debug!(phase = %Phase::Collect, "Phase complete");
        Ok(())
    }

    /// Let participants derive write-only values from the collected ones
    ///
    /// Every participant is asked before anything is inserted, so no
    /// participant sees another's mapped values. A participant contributes
    /// both by returning a mapping and by writing through either view while
    /// its `map_values` runs. Contributions are then inserted
    /// `{WriteOnly, Optional}` in participant order, view writes first, and
    /// the write-only view's cache is reset.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NameCollision` on the first name already in
    /// the store, or `PipelineError::InvalidPhase` on a load pipeline.
    pub fn map(&self) -> Result<()> {
        let (read_write, write_only) = self.save_views(Phase::Map)?;
        debug!(phase = %Phase::Map, "Phase started");

        // Pin fresh snapshots so every participant maps against the same state
        read_write.reset_caches();
        write_only.reset_caches();
        read_write.snapshot();
        write_only.snapshot();

        let mut pending: Vec<(&ParticipantAdapter, Vec<(QualifiedName, Value)>)> = Vec::new();
        for participant in &self.participants {
            self.writes.open();
            let mapped = participant.map(read_write, write_only);
            let mut contributed = self.writes.close();
            let written = contributed.len();
            contributed.extend(mapped.into_iter().flatten());
            if !contributed.is_empty() {
                debug!(
                    participant = participant.name(),
                    mapped = contributed.len() - written,
                    written,
                    "Deferred mapped values"
                );
                pending.push((participant, contributed));
            }
        }

        if !pending.is_empty() {
            let committed = pending.into_iter().try_for_each(|(participant, contributed)| {
                self.insert_all(participant, Phase::Map, contributed, Visibility::WRITE_ONLY)
            });
            write_only.reset_caches();
            committed?;
        }

        debug!(phase = %Phase::Map, "Phase complete");
        Ok(())
    }

    /// Run every participant's save I/O, in order
    ///
    /// # Errors
    ///
    /// On the first participant failure or timeout, aborts every participant
    /// and returns that failure. Returns `PipelineError::InvalidPhase` on a
    /// load pipeline.
    pub async fn on_save(&self, timeout: Duration) -> Result<()> {
        let (read_write, write_only) = self.save_views(Phase::Save)?;
        debug!(phase = %Phase::Save, timeout = ?timeout, "Phase started");

        for participant in &self.participants {
            let outcome =
                tokio::time::timeout(timeout, participant.on_save(read_write, write_only, timeout))
                    .await;
            self.settle(participant, Phase::Save, timeout, outcome)?;
        }

        debug!(phase = %Phase::Save, "Phase complete");
        Ok(())
    }

    /// Notify every participant that the backend committed, in order
    ///
    /// # Errors
    ///
    /// On the first participant failure or timeout, aborts every participant
    /// and returns that failure. Returns `PipelineError::InvalidPhase` on a
    /// load pipeline.
    pub async fn on_saved(&self, timeout: Duration) -> Result<()> {
        self.save_views(Phase::Saved)?;
        debug!(phase = %Phase::Saved, timeout = ?timeout, "Phase started");

        for participant in &self.participants {
            let outcome = tokio::time::timeout(timeout, participant.on_saved(timeout)).await;
            self.settle(participant, Phase::Saved, timeout, outcome)?;
        }

        debug!(phase = %Phase::Saved, "Phase complete");
        Ok(())
    }

    /// Run every participant's load I/O, in order
    ///
    /// # Errors
    ///
    /// On the first participant failure or timeout, aborts every participant
    /// and returns that failure. Returns `PipelineError::InvalidPhase` on a
    /// save pipeline.
    pub async fn on_load(&self, timeout: Duration) -> Result<()> {
        if self.mode.is_save() {
            return Err(PipelineError::InvalidPhase {
                phase: Phase::Load,
                mode: self.mode,
            });
        }
        debug!(phase = %Phase::Load, timeout = ?timeout, "Phase started");

        for participant in &self.participants {
            let outcome =
                tokio::time::timeout(timeout, participant.on_load(&self.read_write_view, timeout))
                    .await;
            self.settle(participant, Phase::Load, timeout, outcome)?;
        }

        debug!(phase = %Phase::Load, "Phase complete");
        Ok(())
    }

    /// Hand the read-write view to every participant, in order
    ///
    /// Publishing never changes the store and may be repeated.
    pub fn publish(&self) {
        debug!(phase = %Phase::Publish, "Phase started");
        for participant in &self.participants {
            participant.publish(&self.read_write_view);
        }
        debug!(phase = %Phase::Publish, "Phase complete");
    }

    fn save_views(&self, phase: Phase) -> Result<(&ValueView, &ValueView)> {
        match &self.write_only_view {
            Some(write_only) if phase.is_save_only() => Ok((&self.read_write_view, write_only)),
            _ => Err(PipelineError::InvalidPhase {
                phase,
                mode: self.mode,
            }),
        }
    }

    fn insert_all(
        &self,
        participant: &ParticipantAdapter,
        phase: Phase,
        values: impl IntoIterator<Item = (QualifiedName, Value)>,
        visibility: Visibility,
    ) -> Result<()> {
        let mut store = self.store.write();
        for (name, value) in values {
            store
                .insert(name, value, visibility)
                .map_err(|e| collision(e, participant, phase))?;
        }
        Ok(())
    }

    fn settle(
        &self,
        participant: &ParticipantAdapter,
        phase: Phase,
        timeout: Duration,
        outcome: std::result::Result<ParticipantResult, Elapsed>,
    ) -> Result<()> {
        let err = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => {
                warn!(
                    participant = participant.name(),
                    phase = %phase,
                    error = %e,
                    "Participant failed"
                );
                PipelineError::Participant(e)
            }
            Err(_) => {
                warn!(
                    participant = participant.name(),
                    phase = %phase,
                    timeout = ?timeout,
                    "Participant timed out"
                );
                PipelineError::Timeout {
                    participant: participant.name().to_string(),
                    phase,
                    timeout,
                }
            }
        };
        self.abort();
        Err(err)
    }

    fn abort(&self) {
        info!(
            participants = self.participants.len(),
            "Aborting persistence participants"
        );
        for participant in &self.participants {
            if let Err(e) = participant.abort() {
                debug!(
                    participant = participant.name(),
                    phase = %Phase::Abort,
                    error = %e,
                    "Discarded abort failure"
                );
            }
        }
    }
}

fn collision(err: NameCollision, participant: &ParticipantAdapter, phase: Phase) -> PipelineError {
    warn!(
        participant = participant.name(),
        phase = %phase,
        name = %err.name,
        "Name collision"
    );
    PipelineError::NameCollision {
        name: err.name,
        participant: participant.name().to_string(),
        phase,
    }
}

impl std::fmt::Debug for PersistencePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistencePipeline")
            .field("mode", &self.mode)
            .field("participants", &self.participants)
            .finish()
    }
}
