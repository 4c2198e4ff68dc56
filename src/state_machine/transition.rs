//! Pure phase transition function
//!
//! Given the current phase, a guard snapshot, and one event, produce the next
//! phase plus an ordered list of effects. No I/O happens here; the runtime
//! executes the effects. Guard rejections leave the phase unchanged and
//! produce no effects, so a rejected submission can never mutate the
//! transcript.

use super::{Effect, Event, TurnGuards, TurnPhase};
use crate::reveal::RevealState;
use thiserror::Error;

/// Diagnostic text substituted for the remote payload when the tutor backend
/// reports no usable failure detail.
pub const DIAGNOSTIC_FALLBACK: &str = "⚠️ Error: Something went wrong. Please try again.";

/// Result of a phase transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_phase: TurnPhase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(phase: TurnPhase) -> Self {
        Self {
            new_phase: phase,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Rejections and invalid pairings. All of these are silent no-ops from the
/// user's perspective; the runtime only logs them.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("session not established, submission rejected")]
    SessionNotReady,
    #[error("choice gate active, free text rejected")]
    GateActive,
    #[error("empty submission rejected")]
    EmptySubmission,
    #[error("choice {choice:?} is not offered by the gated turn")]
    ChoiceNotOffered { choice: String },
    #[error("submission already in flight")]
    Busy,
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function for the submission cycle.
pub fn transition(
    phase: &TurnPhase,
    guards: &TurnGuards,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (phase, event) {
        // ============================================================
        // Submission admission (Idle is the sole admission point)
        // ============================================================
        (TurnPhase::Idle, Event::SubmitText { text }) => {
            if !guards.session_ready {
                return Err(TransitionError::SessionNotReady);
            }
            if guards.gate_active() {
                return Err(TransitionError::GateActive);
            }
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(TransitionError::EmptySubmission);
            }
            Ok(TransitionResult::new(TurnPhase::AwaitingRemote)
                .with_effect(Effect::append_user_turn(&text))
                .with_effect(Effect::request_exchange(text)))
        }

        (TurnPhase::Idle, Event::SelectChoice { choice }) => {
            if !guards.session_ready {
                return Err(TransitionError::SessionNotReady);
            }
            // Covers both an inactive gate (stale click on a superseded
            // turn) and a value the gated turn never offered.
            if !guards.gate_offers(&choice) {
                return Err(TransitionError::ChoiceNotOffered { choice });
            }
            Ok(TransitionResult::new(TurnPhase::AwaitingRemote)
                .with_effect(Effect::ResolveChoice {
                    choice: choice.clone(),
                })
                .with_effect(Effect::append_user_turn(&choice))
                .with_effect(Effect::request_exchange(choice)))
        }

        // Busy phases reject all submissions
        (TurnPhase::AwaitingRemote | TurnPhase::Revealing(_), Event::SubmitText { .. })
        | (TurnPhase::AwaitingRemote | TurnPhase::Revealing(_), Event::SelectChoice { .. }) => {
            Err(TransitionError::Busy)
        }

        // ============================================================
        // Remote exchange completion
        // ============================================================
        (TurnPhase::AwaitingRemote, Event::ExchangeSucceeded { output, choices }) => {
            Ok(
                TransitionResult::new(TurnPhase::Revealing(RevealState::new(
                    output.clone(),
                    choices.clone(),
                )))
                .with_effect(Effect::BeginReveal {
                    text: output,
                    choices,
                }),
            )
        }

        // Failures are absorbed into the same reveal path with a diagnostic
        // turn; the renderer never sees a distinct failure state.
        (TurnPhase::AwaitingRemote, Event::ExchangeFailed { detail }) => {
            let text = diagnostic_text(detail.as_deref());
            Ok(
                TransitionResult::new(TurnPhase::Revealing(RevealState::new(
                    text.clone(),
                    Vec::new(),
                )))
                .with_effect(Effect::BeginReveal {
                    text,
                    choices: Vec::new(),
                }),
            )
        }

        // ============================================================
        // Reveal progression
        // ============================================================
        (TurnPhase::Revealing(reveal), Event::RevealStep { cursor }) => {
            match reveal.advance_to(cursor) {
                Some(next) => {
                    let prefix = next.prefix();
                    Ok(TransitionResult::new(TurnPhase::Revealing(next))
                        .with_effect(Effect::PublishReveal { prefix }))
                }
                None => Err(TransitionError::InvalidTransition(format!(
                    "reveal step to {cursor} from cursor {}",
                    reveal.cursor()
                ))),
            }
        }

        (TurnPhase::Revealing(reveal), Event::RevealFinished) if reveal.is_complete() => {
            Ok(TransitionResult::new(TurnPhase::Idle)
                .with_effect(Effect::CommitModelTurn {
                    text: reveal.text().to_string(),
                    choices: reveal.choices().to_vec(),
                })
                .with_effect(Effect::NotifyIdle))
        }

        // ============================================================
        // Invalid pairings
        // ============================================================
        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "no transition from {phase:?} with event {event:?}"
        ))),
    }
}

/// Diagnostic turn text for a failed exchange, preferring the
/// server-reported detail.
pub fn diagnostic_text(detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("⚠️ Error: {d}"),
        None => DIAGNOSTIC_FALLBACK.to_string(),
    }
}
