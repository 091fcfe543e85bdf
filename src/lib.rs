//! Instate - persistence pipeline for workflow instance state
//!
//! Instate drives the extensions of a workflow instance through the phases
//! of one save or one load. Extensions contribute named values, derive
//! further values from them, perform their own I/O alongside the backend
//! write or read, and receive the restored values afterwards.
//!
//! # Quick Start
//!
//! ```ignore
//! use instate::{PersistencePipeline, PipelineConfig, ValueStore};
//!
//! let config = PipelineConfig::default();
//! let store = ValueStore::new().into_shared();
//! let pipeline = PersistencePipeline::save_from_config(extensions, store.clone(), &config);
//!
//! pipeline.collect()?;
//! pipeline.map()?;
//! pipeline.on_save(config.save_timeout()).await?;
//! // hand `store` to the backend and commit
//! pipeline.on_saved(config.save_timeout()).await?;
//! ```
//!
//! # Architecture
//!
//! - `instate-core`: qualified names, values, the value store and its views
//! - `instate-pipeline`: participant contracts, the adapter and the pipeline

pub use instate_core::{
    Access, Error as StoreError, InstanceValue, NameCollision, QualifiedName, Requirement,
    SharedValueStore, Value, ValueMap, ValueStore, ValueView, Visibility, WriteBuffer,
    MAX_QUALIFIED_NAME_LENGTH,
};
pub use instate_pipeline::{
    Capabilities, CollectedValues, LegacyPersistenceParticipant, ParticipantAdapter,
    ParticipantError, ParticipantKind, ParticipantResult, PersistenceExtension,
    PersistenceIoParticipant, PersistenceParticipant, PersistencePipeline, Phase, PipelineConfig,
    PipelineError, PipelineMode, Result, CONFIG_FILE_NAME,
};
