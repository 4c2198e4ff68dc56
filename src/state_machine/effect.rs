//! Effects produced by phase transitions
//!
//! Effects are executed by the runtime strictly in the order produced, so a
//! single transition can express "resolve the choice, then append the user
//! turn" atomically from the renderer's perspective.

/// Effects to be executed after a phase transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Set `selected_choice` on the gated turn
    ResolveChoice { choice: String },

    /// Append a user turn to the transcript
    AppendUserTurn { text: String },

    /// Issue the remote turn exchange (spawns as a background task)
    RequestExchange { prompt: String },

    /// Start the reveal ticker for a finished model turn, cancelling any
    /// prior reveal outright
    BeginReveal { text: String, choices: Vec<String> },

    /// Publish the latest visible prefix to the renderer
    PublishReveal { prefix: String },

    /// Commit the fully revealed model turn to the transcript
    CommitModelTurn { text: String, choices: Vec<String> },

    /// Tell the renderer the submission cycle is complete
    NotifyIdle,
}

impl Effect {
    pub fn request_exchange(prompt: impl Into<String>) -> Self {
        Effect::RequestExchange {
            prompt: prompt.into(),
        }
    }

    pub fn append_user_turn(text: impl Into<String>) -> Self {
        Effect::AppendUserTurn { text: text.into() }
    }
}
