//! Turn controller state types

use crate::reveal::RevealState;

/// Phase of the submission cycle
///
/// `Idle` is the sole admission point for submissions; the other two phases
/// reject them by construction, so only one exchange and one reveal are ever
/// outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// Ready for user input, no pending operations
    #[default]
    Idle,

    /// User turn appended, remote exchange in flight
    AwaitingRemote,

    /// Response received, prefix reveal in progress
    Revealing(RevealState),
}

impl TurnPhase {
    /// Whether a new submission may be admitted.
    pub fn is_accepting(&self) -> bool {
        matches!(self, TurnPhase::Idle)
    }
}

/// Guard snapshot taken by the runtime just before a transition: session
/// readiness plus the choice gate derived from the transcript's last turn.
#[derive(Debug, Clone, Default)]
pub struct TurnGuards {
    pub session_ready: bool,
    /// Choices of the gated turn, if the gate is active.
    pub pending_choices: Option<Vec<String>>,
}

impl TurnGuards {
    pub fn gate_active(&self) -> bool {
        self.pending_choices.is_some()
    }

    pub fn gate_offers(&self, choice: &str) -> bool {
        self.pending_choices
            .as_ref()
            .is_some_and(|choices| choices.iter().any(|c| c == choice))
    }
}
