//! Session handle: the opaque token scoping all turn exchanges
//!
//! Acquired once at startup. A failed establishment is terminal for the
//! running instance; there is no renewal or re-establishment.

/// Session lifecycle: unestablished until a token arrives, established
/// (and immutable) afterwards.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the token issued by `start_chat`. Ignored if a token is
    /// already present; the token never changes value within one instance.
    pub fn establish(&mut self, token: impl Into<String>) {
        if self.token.is_none() {
            self.token = Some(token.into());
        }
    }

    pub fn is_ready(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
