//! Error types for the persistence pipeline
//!
//! Every error is fatal to the current pipeline invocation. Name collisions
//! surface synchronously from Collect and Map. Participant failures and
//! timeouts surface from the asynchronous phases after every participant
//! has been aborted.

use crate::participant::ParticipantError;
use crate::phase::{Phase, PipelineMode};
use instate_core::QualifiedName;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error types for the persistence pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Two contributions targeted the same qualified name
    #[error("Name collision on key '{name}' during {phase} in extension '{participant}'")]
    NameCollision {
        /// The contested name
        name: QualifiedName,
        /// The extension whose contribution collided
        participant: String,
        /// Collect or Map
        phase: Phase,
    },

    /// A participant's asynchronous call failed; the error is its own
    #[error(transparent)]
    Participant(ParticipantError),

    /// A participant's asynchronous call outlived the phase timeout
    #[error("Extension '{participant}' timed out during {phase} after {timeout:?}")]
    Timeout {
        /// The extension that timed out
        participant: String,
        /// Save, Saved or Load
        phase: Phase,
        /// The timeout the call was given
        timeout: Duration,
    },

    /// The phase does not exist for this pipeline's mode
    #[error("Phase {phase} is not available on a {mode} pipeline")]
    InvalidPhase {
        /// The requested phase
        phase: Phase,
        /// The pipeline's mode
        mode: PipelineMode,
    },

    /// A load pipeline was asked for its write-only view
    #[error("Load pipelines have no write-only view")]
    WriteOnlyViewUnavailable,

    /// Configuration could not be read, parsed or written
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether this error came from a participant's asynchronous call
    pub fn is_participant_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::Participant(_) | PipelineError::Timeout { .. }
        )
    }

    /// The participant's own error, if that is what this is
    pub fn participant_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            PipelineError::Participant(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
