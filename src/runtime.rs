//! Event-driven runtime for the conversation
//!
//! One tokio task owns all conversation state and consumes a single event
//! channel; remote calls and reveal ticking run as spawned tasks that only
//! talk back through that channel, so transcript mutations are applied
//! strictly in event order.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;

use crate::remote::TutorService;
use crate::state_machine::Event;
use crate::transcript::Turn;
use std::path::PathBuf;
use tokio::sync::{broadcast, mpsc};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const UI_CHANNEL_CAPACITY: usize = 128;

/// Events published to the rendering layer
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Session token acquired; submissions will now be admitted.
    SessionReady,
    /// Session establishment failed; terminal for this instance.
    SessionFailed { message: String },
    /// A turn was committed to the transcript (user submission or a fully
    /// revealed model turn).
    TurnAppended { turn: Turn },
    /// The gated turn's selection was recorded.
    ChoiceResolved { choice: String },
    /// Latest visible prefix of the in-progress model turn.
    Reveal { prefix: String },
    /// The submission cycle completed; input is accepted again.
    Idle,
    /// The transcript export was written.
    TranscriptSaved { path: PathBuf },
    /// The transcript export could not be written.
    TranscriptSaveFailed { message: String },
}

/// Handle for driving a running conversation
#[derive(Clone)]
pub struct ChatHandle {
    event_tx: mpsc::Sender<Event>,
}

impl ChatHandle {
    /// Send an event into the conversation.
    pub async fn send(&self, event: Event) -> bool {
        self.event_tx.send(event).await.is_ok()
    }
}

/// Start a conversation runtime in the background.
///
/// The returned receiver is subscribed before the runtime task is spawned,
/// so the greeting and the session outcome are never emitted into an empty
/// broadcast channel.
pub fn start<T: TutorService + 'static>(
    client: T,
) -> (ChatHandle, broadcast::Receiver<UiEvent>) {
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (broadcast_tx, ui_rx) = broadcast::channel(UI_CHANNEL_CAPACITY);

    let runtime = ChatRuntime::new(client, event_rx, event_tx.clone(), broadcast_tx);
    tokio::spawn(async move {
        runtime.run().await;
        tracing::info!("conversation runtime finished");
    });

    (ChatHandle { event_tx }, ui_rx)
}
