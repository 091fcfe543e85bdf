//! Shared recording participants for pipeline integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use instate_core::{QualifiedName, Value, ValueMap, ValueStore, ValueView};
use instate_core::Result as StoreResult;
use instate_pipeline::{
    CollectedValues, LegacyPersistenceParticipant, ParticipantResult, PersistenceExtension,
    PersistenceIoParticipant, PersistenceParticipant, Phase,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Ordered log of `"<participant>:<call>"` entries shared by all recorders
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

/// Route pipeline logs to the test harness's captured output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn qn(s: &str) -> QualifiedName {
    QualifiedName::parse(s).unwrap()
}

pub fn values(pairs: &[(&str, i64)]) -> ValueMap {
    pairs
        .iter()
        .map(|(name, v)| (qn(name), Value::Int(*v)))
        .collect()
}

pub fn empty_store() -> instate_core::SharedValueStore {
    ValueStore::new().into_shared()
}

/// Error injected into a participant call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{participant} failed during {phase}")]
pub struct InjectedFailure {
    pub participant: String,
    pub phase: Phase,
}

/// Participant implementing both capability interfaces
pub struct Recorder {
    name: String,
    journal: Journal,
    read_write: ValueMap,
    write_only: ValueMap,
    mapped: ValueMap,
    fail_on: Option<Phase>,
    fail_abort: bool,
    delay: Option<Duration>,
    io: bool,
    write_through: Option<QualifiedName>,
    /// outcome of each attempted write through a view
    pub view_writes: Mutex<Vec<(Phase, StoreResult<()>)>>,
    /// `(read_write names, write_only names)` observed during map
    pub seen_in_map: Mutex<Option<(Vec<QualifiedName>, Vec<QualifiedName>)>>,
    /// write-only names observed during save
    pub seen_on_save: Mutex<Option<Vec<QualifiedName>>>,
    /// read-write entries received by each publish
    pub published: Mutex<Vec<Vec<(QualifiedName, Value)>>>,
    /// timeouts received by asynchronous calls
    pub timeouts: Mutex<Vec<Duration>>,
}

impl Recorder {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Recorder {
            name: name.to_string(),
            journal: Arc::clone(journal),
            read_write: ValueMap::new(),
            write_only: ValueMap::new(),
            mapped: ValueMap::new(),
            fail_on: None,
            fail_abort: false,
            delay: None,
            io: true,
            write_through: None,
            view_writes: Mutex::new(Vec::new()),
            seen_in_map: Mutex::new(None),
            seen_on_save: Mutex::new(None),
            published: Mutex::new(Vec::new()),
            timeouts: Mutex::new(Vec::new()),
        }
    }

    pub fn read_write(mut self, values: ValueMap) -> Self {
        self.read_write = values;
        self
    }

    pub fn write_only(mut self, values: ValueMap) -> Self {
        self.write_only = values;
        self
    }

    pub fn mapped(mut self, values: ValueMap) -> Self {
        self.mapped = values;
        self
    }

    pub fn fail_on(mut self, phase: Phase) -> Self {
        self.fail_on = Some(phase);
        self
    }

    pub fn fail_abort(mut self) -> Self {
        self.fail_abort = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Try to write `name` through the view handed to every call
    pub fn write_through_view(mut self, name: &str) -> Self {
        self.write_through = Some(qn(name));
        self
    }

    /// Do not advertise the I/O capability
    pub fn without_io(mut self) -> Self {
        self.io = false;
        self
    }

    pub fn failure(&self, phase: Phase) -> InjectedFailure {
        InjectedFailure {
            participant: self.name.clone(),
            phase,
        }
    }

    fn record(&self, call: &str) {
        self.journal.lock().push(format!("{}:{}", self.name, call));
    }

    fn try_write(&self, phase: Phase, view: &ValueView) {
        if let Some(name) = &self.write_through {
            let outcome = view.insert(name.clone(), Value::Bool(true));
            self.view_writes.lock().push((phase, outcome));
        }
    }

    async fn io_call(&self, phase: Phase, timeout: Duration) -> ParticipantResult {
        self.record(phase.as_str());
        self.timeouts.lock().push(timeout);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(phase) {
            return Err(Box::new(self.failure(phase)));
        }
        Ok(())
    }
}

impl PersistenceParticipant for Recorder {
    fn collect_values(&self) -> CollectedValues {
        self.record("collect");
        CollectedValues::new(self.read_write.clone(), self.write_only.clone())
    }

    fn map_values(&self, read_write: &ValueView, write_only: &ValueView) -> Option<ValueMap> {
        self.record("map");
        *self.seen_in_map.lock() = Some((read_write.names(), write_only.names()));
        self.try_write(Phase::Map, read_write);
        if self.mapped.is_empty() {
            None
        } else {
            Some(self.mapped.clone())
        }
    }

    fn publish_values(&self, read_write: &ValueView) {
        self.record("publish");
        self.published.lock().push(read_write.entries());
        self.try_write(Phase::Publish, read_write);
    }
}

#[async_trait]
impl PersistenceIoParticipant for Recorder {
    async fn on_save(
        &self,
        _read_write: &ValueView,
        write_only: &ValueView,
        timeout: Duration,
    ) -> ParticipantResult {
        *self.seen_on_save.lock() = Some(write_only.names());
        self.try_write(Phase::Save, write_only);
        self.io_call(Phase::Save, timeout).await
    }

    async fn on_saved(&self, timeout: Duration) -> ParticipantResult {
        self.io_call(Phase::Saved, timeout).await
    }

    async fn on_load(&self, read_write: &ValueView, timeout: Duration) -> ParticipantResult {
        self.try_write(Phase::Load, read_write);
        self.io_call(Phase::Load, timeout).await
    }

    fn abort(&self) -> ParticipantResult {
        self.record("abort");
        if self.fail_abort {
            return Err(Box::new(self.failure(Phase::Abort)));
        }
        Ok(())
    }
}

impl PersistenceExtension for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_persistence_participant(self: Arc<Self>) -> Option<Arc<dyn PersistenceParticipant>> {
        Some(self)
    }

    fn as_io_participant(self: Arc<Self>) -> Option<Arc<dyn PersistenceIoParticipant>> {
        if self.io {
            Some(self)
        } else {
            None
        }
    }
}

/// Base-class style participant
pub struct LegacyRecorder {
    name: String,
    journal: Journal,
    io: bool,
    read_write: ValueMap,
    fail_on_save: bool,
}

impl LegacyRecorder {
    pub fn new(name: &str, journal: &Journal, io: bool) -> Self {
        LegacyRecorder {
            name: name.to_string(),
            journal: Arc::clone(journal),
            io,
            read_write: ValueMap::new(),
            fail_on_save: false,
        }
    }

    pub fn read_write(mut self, values: ValueMap) -> Self {
        self.read_write = values;
        self
    }

    pub fn fail_on_save(mut self) -> Self {
        self.fail_on_save = true;
        self
    }

    fn record(&self, call: &str) {
        self.journal.lock().push(format!("{}:{}", self.name, call));
    }
}

#[async_trait]
impl LegacyPersistenceParticipant for LegacyRecorder {
    fn is_io_participant(&self) -> bool {
        self.io
    }

    fn is_load_transaction_required(&self) -> bool {
        true
    }

    fn collect_values(&self) -> (Option<ValueMap>, Option<ValueMap>) {
        self.record("collect");
        (Some(self.read_write.clone()), None)
    }

    fn publish_values(&self, _read_write: &ValueView) {
        self.record("publish");
    }

    async fn on_save(
        &self,
        _read_write: &ValueView,
        _write_only: &ValueView,
        _timeout: Duration,
    ) -> ParticipantResult {
        self.record("save");
        if self.fail_on_save {
            return Err(Box::new(InjectedFailure {
                participant: self.name.clone(),
                phase: Phase::Save,
            }));
        }
        Ok(())
    }

    async fn on_load(&self, _read_write: &ValueView, _timeout: Duration) -> ParticipantResult {
        self.record("load");
        Ok(())
    }

    fn abort(&self) -> ParticipantResult {
        self.record("abort");
        Ok(())
    }
}

impl PersistenceExtension for LegacyRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_legacy_participant(self: Arc<Self>) -> Option<Arc<dyn LegacyPersistenceParticipant>> {
        Some(self)
    }
}

pub fn ext<T: PersistenceExtension + 'static>(participant: &Arc<T>) -> Arc<dyn PersistenceExtension> {
    Arc::clone(participant) as Arc<dyn PersistenceExtension>
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().clone()
}
