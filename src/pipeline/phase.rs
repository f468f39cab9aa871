//! Pipeline phases for a single ticket run.

use serde::Serialize;
use std::fmt;

/// Position of a ticket in the fixed processing chain.
///
/// ```text
/// Intake → Classifying → Retrieving → Resolving → EscalationCheck → Recording → Done
/// ```
///
/// There are no loops and no branches; a failed run is abandoned, never resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Intake,
    Classifying,
    Retrieving,
    Resolving,
    EscalationCheck,
    Recording,
    Done,
}

impl PipelinePhase {
    pub const SEQUENCE: [Self; 7] = [
        Self::Intake,
        Self::Classifying,
        Self::Retrieving,
        Self::Resolving,
        Self::EscalationCheck,
        Self::Recording,
        Self::Done,
    ];

    /// The following phase; `Done` is absorbing.
    pub const fn next(self) -> Self {
        match self {
            Self::Intake => Self::Classifying,
            Self::Classifying => Self::Retrieving,
            Self::Retrieving => Self::Resolving,
            Self::Resolving => Self::EscalationCheck,
            Self::EscalationCheck => Self::Recording,
            Self::Recording | Self::Done => Self::Done,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Intake => "intake",
            Self::Classifying => "classification",
            Self::Retrieving => "retrieval",
            Self::Resolving => "resolution",
            Self::EscalationCheck => "escalation check",
            Self::Recording => "metrics recording",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_walks_the_sequence() {
        let mut phase = PipelinePhase::Intake;
        for expected in PipelinePhase::SEQUENCE.iter().skip(1) {
            phase = phase.next();
            assert_eq!(phase, *expected);
        }
        assert!(phase.is_terminal());
        assert_eq!(phase.next(), PipelinePhase::Done);
    }
}
