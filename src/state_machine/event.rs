//! Events that drive the turn controller

use std::path::PathBuf;

/// Events that trigger phase transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    /// Free-text submission from the input surface
    SubmitText { text: String },
    /// A clicked choice on the gated turn
    SelectChoice { choice: String },

    // Remote exchange events
    ExchangeSucceeded {
        output: String,
        choices: Vec<String>,
    },
    /// Transport or server failure; `detail` is the server-reported text,
    /// when the server supplied one.
    ExchangeFailed { detail: Option<String> },

    // Reveal ticker events
    /// The reveal cursor reached `cursor` characters.
    RevealStep { cursor: usize },
    /// The full-length prefix has been emitted.
    RevealFinished,

    /// Out-of-band read request, serviced by the runtime without a phase
    /// transition: write the transcript export to `path`.
    ExportTranscript { path: PathBuf },
}
