//! Persistence pipeline for workflow instance state
//!
//! Drives an ordered set of participants through the phases that collect,
//! transform, persist and restore a workflow instance's named values:
//!
//! - Save: `collect` -> `map` -> `on_save` -> (backend commit) -> `on_saved`
//! - Load: (backend read) -> `on_load` -> `publish`
//!
//! Any failure during an asynchronous phase aborts every participant before
//! the failure is returned to the caller.
//!
//! # Modules
//!
//! - `participant`: the legacy and capability-interface participant traits
//! - `adapter`: resolves either shape into one call surface
//! - `pipeline`: the orchestrator
//! - `config`: `instate.toml` settings
//! - `phase`: phase and mode enums
//! - `error`: `PipelineError`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod participant;
pub mod phase;
pub mod pipeline;

pub use adapter::{Capabilities, ParticipantAdapter, ParticipantKind};
pub use config::{PipelineConfig, CONFIG_FILE_NAME};
pub use error::{PipelineError, Result};
pub use participant::{
    CollectedValues, LegacyPersistenceParticipant, ParticipantError, ParticipantResult,
    PersistenceExtension, PersistenceIoParticipant, PersistenceParticipant,
};
pub use phase::{Phase, PipelineMode};
pub use pipeline::PersistencePipeline;
