//! sparky-chat - terminal client for the Sparky tutoring backend
//!
//! Drives the conversation turn-taking state machine: session establishment,
//! message dispatch, simulated-typing reveals, and the choice-selection
//! sub-protocol.

mod remote;
mod reveal;
mod runtime;
mod session;
mod state_machine;
mod transcript;

use remote::HttpTutorService;
use runtime::UiEvent;
use state_machine::Event;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use transcript::Role;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_EXPORT_PATH: &str = "transcript.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout belongs to the conversation.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sparky_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let base_url =
        std::env::var("SPARKY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    tracing::info!(%base_url, "connecting to tutor backend");

    let client = HttpTutorService::new(base_url)?;
    let (handle, mut ui) = runtime::start(client);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut state = RenderState::new();
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            event = ui.recv() => match event {
                Ok(event) => render(&event, &mut state, &mut stdout)?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "renderer fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                let input = line.trim().to_string();
                if input.is_empty() {
                    continue;
                }

                if input == "/quit" {
                    break;
                }
                if let Some(rest) = input.strip_prefix("/save") {
                    let path = rest.trim();
                    let path = if path.is_empty() { DEFAULT_EXPORT_PATH } else { path };
                    handle.send(Event::ExportTranscript { path: PathBuf::from(path) }).await;
                    continue;
                }

                let event = if state.pending_choices.is_empty() {
                    Event::SubmitText { text: input }
                } else if let Some(choice) = match_choice(&input, &state.pending_choices) {
                    Event::SelectChoice { choice }
                } else {
                    println!("(pick a choice: 1-{})", state.pending_choices.len());
                    continue;
                };
                handle.send(event).await;
            }
        }
    }

    Ok(())
}

/// Map terminal input to one of the offered choices: a bare 1-based number
/// or the choice text itself (case-insensitive).
fn match_choice(input: &str, choices: &[String]) -> Option<String> {
    if let Ok(n) = input.parse::<usize>() {
        if (1..=choices.len()).contains(&n) {
            return Some(choices[n - 1].clone());
        }
    }
    choices
        .iter()
        .find(|c| c.eq_ignore_ascii_case(input))
        .cloned()
}

/// Renderer state carried across events: the actionable choice set and how
/// many characters of an in-progress reveal are already on screen.
struct RenderState {
    pending_choices: Vec<String>,
    /// `Some(n)` while a reveal is in progress, even when `n` is zero.
    reveal_progress: Option<usize>,
}

impl RenderState {
    fn new() -> Self {
        Self {
            pending_choices: Vec::new(),
            reveal_progress: None,
        }
    }
}

fn render(event: &UiEvent, state: &mut RenderState, out: &mut impl Write) -> io::Result<()> {
    match event {
        UiEvent::SessionReady => prompt(out)?,
        UiEvent::SessionFailed { message } => {
            tracing::error!(%message, "session could not be established");
            writeln!(out, "(Sparky is unavailable right now - restart to try again)")?;
        }
        UiEvent::Reveal { prefix } => {
            let shown = state.reveal_progress.unwrap_or(0);
            if state.reveal_progress.is_none() {
                write!(out, "Sparky: ")?;
            }
            let delta: String = prefix.chars().skip(shown).collect();
            write!(out, "{delta}")?;
            state.reveal_progress = Some(prefix.chars().count());
            out.flush()?;
        }
        UiEvent::TurnAppended { turn } => {
            if turn.role == Role::Model {
                if state.reveal_progress.is_none() {
                    // Committed without a reveal (the greeting).
                    write!(out, "Sparky: {}", turn.text)?;
                }
                writeln!(out)?;
                state.reveal_progress = None;
                state.pending_choices.clone_from(&turn.choices);
                for (i, choice) in turn.choices.iter().enumerate() {
                    writeln!(out, "  {}. {choice}", i + 1)?;
                }
            }
        }
        UiEvent::ChoiceResolved { .. } => state.pending_choices.clear(),
        UiEvent::Idle => prompt(out)?,
        UiEvent::TranscriptSaved { path } => {
            writeln!(out, "(saved transcript to {})", path.display())?;
            prompt(out)?;
        }
        UiEvent::TranscriptSaveFailed { message } => {
            writeln!(out, "(could not save transcript: {message})")?;
            prompt(out)?;
        }
    }
    Ok(())
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}
