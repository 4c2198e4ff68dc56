//! Conversation transcript: the ground truth of the conversation
//!
//! The transcript is an append-only sequence of committed turns. The choice
//! gate is derived from the final turn, never stored. An in-progress reveal
//! is an overlay kept by the runtime; it never mutates a committed turn.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Opening model turn seeded into every new transcript.
pub const GREETING: &str = "Hi there! I'm Sparky, your learning buddy. What's your name?";

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One utterance in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Selectable options offered by this turn; empty for user turns and
    /// for model turns that invite free text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    /// Set once the user has resolved this turn's choices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_choice: Option<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            choices: Vec::new(),
            selected_choice: None,
        }
    }

    pub fn model(text: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            choices,
            selected_choice: None,
        }
    }

    /// Whether this turn still offers an unresolved selection.
    pub fn offers_unresolved_choices(&self) -> bool {
        self.role == Role::Model && !self.choices.is_empty() && self.selected_choice.is_none()
    }
}

/// A turn as written to the export artifact; choices are implementation
/// detail and are not exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedTurn {
    pub role: Role,
    pub text: String,
}

/// Errors writing the export artifact
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write transcript file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only ordered sequence of turns
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// A transcript seeded with the greeting turn, as shown on startup.
    pub fn seeded() -> Self {
        Self {
            turns: vec![Turn::model(GREETING, Vec::new())],
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Choices of the final turn, if that turn is a model turn with an
    /// unresolved selection. This is the choice gate.
    pub fn pending_choices(&self) -> Option<&[String]> {
        match self.turns.last() {
            Some(turn) if turn.offers_unresolved_choices() => Some(&turn.choices),
            _ => None,
        }
    }

    /// Whether free-text submission is currently suppressed.
    pub fn gate_active(&self) -> bool {
        self.pending_choices().is_some()
    }

    /// Record the user's selection on the final turn.
    ///
    /// Only the chronologically last turn is ever considered, and only while
    /// its selection is unset; anything else is a no-op. Returns whether the
    /// selection was recorded.
    pub fn resolve_choice(&mut self, choice: &str) -> bool {
        let Some(turn) = self.turns.last_mut() else {
            return false;
        };
        if !turn.offers_unresolved_choices() || !turn.choices.iter().any(|c| c == choice) {
            return false;
        }
        turn.selected_choice = Some(choice.to_string());
        true
    }

    /// The export payload: ordered `{role, text}` pairs.
    pub fn export(&self) -> Vec<ExportedTurn> {
        self.turns
            .iter()
            .map(|turn| ExportedTurn {
                role: turn.role,
                text: turn.text.clone(),
            })
            .collect()
    }

    /// Write the export payload as pretty JSON.
    pub fn write_export(&self, mut writer: impl Write) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, &self.export())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write the export payload to a file.
    pub fn save_to(&self, path: &Path) -> Result<(), ExportError> {
        let file = std::fs::File::create(path)?;
        self.write_export(std::io::BufWriter::new(file))
    }
}
