//! Pipeline phases and construction modes

use std::fmt;

/// One ordered pass of the pipeline across all participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Gather values from participants (save)
    Collect,
    /// Derive write-only values from collected ones (save)
    Map,
    /// Participant I/O before the backend commit (save)
    Save,
    /// Notification after the backend commit (save)
    Saved,
    /// Participant I/O after the backend read (load)
    Load,
    /// Hand restored values to participants
    Publish,
    /// Best-effort cleanup after an I/O failure
    Abort,
}

impl Phase {
    /// Lower-case phase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Collect => "collect",
            Phase::Map => "map",
            Phase::Save => "save",
            Phase::Saved => "saved",
            Phase::Load => "load",
            Phase::Publish => "publish",
            Phase::Abort => "abort",
        }
    }

    /// Whether the phase only exists on a save pipeline
    pub fn is_save_only(&self) -> bool {
        matches!(
            self,
            Phase::Collect | Phase::Map | Phase::Save | Phase::Saved
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a pipeline was constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineMode {
    /// Collect, Map, Save, Saved (and Publish)
    Save {
        /// Whether collected write-only values are kept
        persist_write_only_values: bool,
    },
    /// Load and Publish
    Load,
}

impl PipelineMode {
    /// Check if this is a save pipeline
    pub fn is_save(&self) -> bool {
        matches!(self, PipelineMode::Save { .. })
    }

    /// Whether collected write-only values are kept
    pub fn persist_write_only_values(&self) -> bool {
        matches!(
            self,
            PipelineMode::Save {
                persist_write_only_values: true
            }
        )
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Save { .. } => f.write_str("save"),
            PipelineMode::Load => f.write_str("load"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_only_phases() {
        for phase in [Phase::Collect, Phase::Map, Phase::Save, Phase::Saved] {
            assert!(phase.is_save_only(), "{phase}");
        }
        for phase in [Phase::Load, Phase::Publish, Phase::Abort] {
            assert!(!phase.is_save_only(), "{phase}");
        }
    }

    #[test]
    fn test_mode_flags() {
        let save = PipelineMode::Save {
            persist_write_only_values: true,
        };
        assert!(save.is_save());
        assert!(save.persist_write_only_values());
        assert!(!PipelineMode::Save {
            persist_write_only_values: false
        }
        .persist_write_only_values());
        assert!(!PipelineMode::Load.is_save());
        assert!(!PipelineMode::Load.persist_write_only_values());
        assert_eq!(PipelineMode::Load.to_string(), "load");
    }
}
