//! Per-stage phase state machine
//!
//! ```text
//! PENDING -> DATA_GATHERED -> EXTRACTED -> DONE
//!    |              |
//!    +--------------+------> DEGRADED -> DONE
//! ```

use crate::stage::StageOutcome;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Phase of a single stage invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StagePhase {
    /// Not started
    Pending,
    /// Upstream reads and collector calls completed
    DataGathered,
    /// Record produced by schema-enforced or parsed extraction
    Extracted,
    /// Record produced by a static fallback
    Degraded,
    /// Record handed back to the pipeline
    Done,
}

impl StagePhase {
    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(self, next: StagePhase) -> bool {
        use StagePhase::{DataGathered, Degraded, Done, Extracted, Pending};
        matches!(
            (self, next),
            (Pending, DataGathered | Degraded)
                | (DataGathered, Extracted | Degraded)
                | (Extracted | Degraded, Done)
        )
    }

    /// Terminal outcome carried by this phase, if it is one
    pub fn outcome(self) -> Option<StageOutcome> {
        match self {
            Self::Extracted => Some(StageOutcome::Extracted),
            Self::Degraded => Some(StageOutcome::Degraded),
            _ => None,
        }
    }

    /// Upper-case label used in logs and error messages
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::DataGathered => "DATA_GATHERED",
            Self::Extracted => "EXTRACTED",
            Self::Degraded => "DEGRADED",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for StagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the phase of one stage invocation and rejects illegal transitions
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    stage: String,
    history: Vec<StagePhase>,
}

impl PhaseTracker {
    /// Start tracking a stage in [`StagePhase::Pending`]
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            history: vec![StagePhase::Pending],
        }
    }

    /// Current phase
    pub fn phase(&self) -> StagePhase {
        self.history
            .last()
            .copied()
            .unwrap_or(StagePhase::Pending)
    }

    /// Every phase visited so far, oldest first
    pub fn history(&self) -> &[StagePhase] {
        &self.history
    }

    /// Move to `next`
    pub fn advance(&mut self, next: StagePhase) -> Result<()> {
        let current = self.phase();
        if !current.can_advance_to(next) {
            return Err(Error::InvalidTransition {
                stage: self.stage.clone(),
                from: current,
                to: next,
            });
        }
        debug!(stage = %self.stage, from = %current, to = %next, "Stage phase transition");
        self.history.push(next);
        Ok(())
    }

    /// Move to [`StagePhase::Done`] and report the terminal outcome
    pub fn finish(&mut self) -> Result<StageOutcome> {
        let outcome = self.phase().outcome().ok_or_else(|| Error::InvalidTransition {
            stage: self.stage.clone(),
            from: self.phase(),
            to: StagePhase::Done,
        })?;
        self.advance(StagePhase::Done)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_path() {
        let mut tracker = PhaseTracker::new("technical");
        tracker.advance(StagePhase::DataGathered).unwrap();
        tracker.advance(StagePhase::Extracted).unwrap();
        assert_eq!(tracker.finish().unwrap(), StageOutcome::Extracted);
        assert_eq!(
            tracker.history(),
            &[
                StagePhase::Pending,
                StagePhase::DataGathered,
                StagePhase::Extracted,
                StagePhase::Done
            ]
        );
    }

    #[test]
    fn test_short_circuit_skips_data_gathered() {
        let mut tracker = PhaseTracker::new("fundamentals");
        tracker.advance(StagePhase::Degraded).unwrap();
        assert_eq!(tracker.finish().unwrap(), StageOutcome::Degraded);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut tracker = PhaseTracker::new("bear");
        assert!(tracker.advance(StagePhase::Extracted).is_err());
        assert!(tracker.finish().is_err());
        assert_eq!(tracker.phase(), StagePhase::Pending);

        tracker.advance(StagePhase::DataGathered).unwrap();
        tracker.advance(StagePhase::Degraded).unwrap();
        tracker.finish().unwrap();
        assert!(tracker.advance(StagePhase::Extracted).is_err());
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&StagePhase::DataGathered).unwrap();
        assert_eq!(json, "\"DATA_GATHERED\"");
    }
}
