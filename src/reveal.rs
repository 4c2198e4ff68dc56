//! Reveal engine core: simulated typing over a finished model turn
//!
//! A reveal turns the fully-received text into a growing prefix, one
//! character per tick. The cursor counts characters, not bytes, so every
//! prefix is valid UTF-8. The runtime drives the cadence and owns the
//! cancellation token; this module is the pure part.

use std::time::Duration;

/// Cadence between prefix emissions.
pub const REVEAL_TICK: Duration = Duration::from_millis(15);

/// The single in-flight reveal: final text, any offered choices, and a
/// monotone cursor in `[0, char_len]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealState {
    text: String,
    choices: Vec<String>,
    cursor: usize,
}

impl RevealState {
    pub fn new(text: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            text: text.into(),
            choices,
            cursor: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of emissions after the initial empty prefix.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The currently visible prefix.
    pub fn prefix(&self) -> String {
        prefix_of(&self.text, self.cursor)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.char_len()
    }

    /// Advance the cursor to `cursor`. Only the immediate successor of the
    /// current position is accepted; anything else is a stale or skipped
    /// tick and is refused.
    pub fn advance_to(&self, cursor: usize) -> Option<Self> {
        if cursor != self.cursor + 1 || cursor > self.char_len() {
            return None;
        }
        let mut next = self.clone();
        next.cursor = cursor;
        Some(next)
    }
}

/// The first `chars` characters of `text`.
pub fn prefix_of(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}
