//! Conversation runtime executor

use super::UiEvent;
use crate::remote::TutorService;
use crate::reveal::REVEAL_TICK;
use crate::session::Session;
use crate::state_machine::{
    transition, Effect, Event, TransitionError, TransitionResult, TurnGuards, TurnPhase,
};
use crate::transcript::{Transcript, Turn};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Generic conversation runtime over any tutor service implementation
pub struct ChatRuntime<T: TutorService + 'static> {
    client: Arc<T>,
    session: Session,
    transcript: Transcript,
    phase: TurnPhase,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<UiEvent>,
    /// Token for the in-flight reveal ticker; a superseding reveal cancels
    /// it before its remaining emissions can apply.
    reveal_cancel: Option<CancellationToken>,
}

impl<T: TutorService + 'static> ChatRuntime<T> {
    pub fn new(
        client: T,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            session: Session::new(),
            transcript: Transcript::seeded(),
            phase: TurnPhase::Idle,
            event_rx,
            event_tx,
            broadcast_tx,
            reveal_cancel: None,
        }
    }

    /// The renderer-facing view: committed turns, with the in-progress
    /// reveal overlaid as a trailing model turn. Committed turns are never
    /// mutated in place.
    pub fn visible_turns(&self) -> Vec<Turn> {
        let mut turns = self.transcript.turns().to_vec();
        if let TurnPhase::Revealing(reveal) = &self.phase {
            turns.push(Turn::model(reveal.prefix(), Vec::new()));
        }
        turns
    }

    pub async fn run(mut self) {
        tracing::info!("starting conversation runtime");

        // The greeting is visible before (and regardless of) establishment.
        if let Some(greeting) = self.transcript.last() {
            let _ = self.broadcast_tx.send(UiEvent::TurnAppended {
                turn: greeting.clone(),
            });
        }

        self.establish_session().await;

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::info!("conversation runtime stopped");
    }

    /// Acquire the session token, once. Failure is terminal: the session
    /// stays unready and every later submission is guard-rejected.
    async fn establish_session(&mut self) {
        match self.client.start_chat().await {
            Ok(token) => {
                tracing::info!("session established");
                self.session.establish(token);
                let _ = self.broadcast_tx.send(UiEvent::SessionReady);
            }
            Err(e) => {
                tracing::error!(error = %e, "session establishment failed");
                let _ = self.broadcast_tx.send(UiEvent::SessionFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn guards(&self) -> TurnGuards {
        TurnGuards {
            session_ready: self.session.is_ready(),
            pending_choices: self.transcript.pending_choices().map(<[String]>::to_vec),
        }
    }

    fn process_event(&mut self, event: Event) {
        // Export is a pure read of current state, valid in every phase; it
        // is serviced here instead of growing the state machine.
        let event = match event {
            Event::ExportTranscript { path } => {
                match self.transcript.save_to(&path) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "transcript saved");
                        let _ = self.broadcast_tx.send(UiEvent::TranscriptSaved { path });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to save transcript");
                        let _ = self.broadcast_tx.send(UiEvent::TranscriptSaveFailed {
                            message: e.to_string(),
                        });
                    }
                }
                return;
            }
            other => other,
        };

        let TransitionResult { new_phase, effects } =
            match transition(&self.phase, &self.guards(), event) {
                Ok(result) => result,
                Err(e @ TransitionError::InvalidTransition(_)) => {
                    // Ticker events from a cancelled reveal land here.
                    tracing::trace!(reason = %e, "event discarded");
                    return;
                }
                Err(e) => {
                    // Guard rejections are silent no-ops.
                    tracing::debug!(reason = %e, "submission rejected");
                    return;
                }
            };

        self.phase = new_phase;
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::ResolveChoice { choice } => {
                if self.transcript.resolve_choice(&choice) {
                    let _ = self.broadcast_tx.send(UiEvent::ChoiceResolved { choice });
                } else {
                    // Unreachable while guards are computed from the same
                    // transcript, but never worth corrupting state over.
                    tracing::warn!(choice = %choice, "choice resolution ignored");
                }
            }

            Effect::AppendUserTurn { text } => {
                let turn = Turn::user(text);
                self.transcript.push(turn.clone());
                let _ = self.broadcast_tx.send(UiEvent::TurnAppended { turn });
            }

            Effect::RequestExchange { prompt } => self.request_exchange(prompt),

            Effect::BeginReveal { text, choices: _ } => self.begin_reveal(&text),

            Effect::PublishReveal { prefix } => {
                let _ = self.broadcast_tx.send(UiEvent::Reveal { prefix });
            }

            Effect::CommitModelTurn { text, choices } => {
                self.reveal_cancel = None;
                let turn = Turn::model(text, choices);
                self.transcript.push(turn.clone());
                let _ = self.broadcast_tx.send(UiEvent::TurnAppended { turn });
            }

            Effect::NotifyIdle => {
                let _ = self.broadcast_tx.send(UiEvent::Idle);
            }
        }
    }

    /// Issue the remote turn exchange as a background task. There is no
    /// cancellation for in-flight exchanges; the result is always delivered
    /// back through the event channel.
    fn request_exchange(&self, prompt: String) {
        let event_tx = self.event_tx.clone();

        let Some(session_id) = self.session.token().map(str::to_string) else {
            // Admission requires readiness, so this cannot happen; converge
            // to the diagnostic path anyway.
            tracing::warn!("exchange requested without a session token");
            tokio::spawn(async move {
                let _ = event_tx.send(Event::ExchangeFailed { detail: None }).await;
            });
            return;
        };

        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            tracing::debug!("exchanging turn with tutor backend");
            let event = match client.send_message(&prompt, &session_id).await {
                Ok(payload) => Event::ExchangeSucceeded {
                    output: payload.output,
                    choices: payload.choices,
                },
                Err(e) => {
                    tracing::warn!(error = %e, "turn exchange failed");
                    Event::ExchangeFailed { detail: e.detail }
                }
            };
            let _ = event_tx.send(event).await;
        });
    }

    /// Start the reveal ticker, cancelling any prior reveal outright so its
    /// remaining emissions never apply.
    fn begin_reveal(&mut self, text: &str) {
        if let Some(prev) = self.reveal_cancel.take() {
            prev.cancel();
        }
        let cancel = CancellationToken::new();
        self.reveal_cancel = Some(cancel.clone());

        // The zero-length prefix is the first emission.
        let _ = self.broadcast_tx.send(UiEvent::Reveal {
            prefix: String::new(),
        });

        let total = text.chars().count();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            for cursor in 1..=total {
                tokio::time::sleep(REVEAL_TICK).await;
                if cancel.is_cancelled() {
                    return;
                }
                if event_tx.send(Event::RevealStep { cursor }).await.is_err() {
                    return;
                }
            }
            if cancel.is_cancelled() {
                return;
            }
            let _ = event_tx.send(Event::RevealFinished).await;
        });
    }
}
