//! Remote tutor collaborator
//!
//! The backend is treated as an opaque remote capability with two routes:
//! `GET /start_chat` issues the session token and `POST /send_message`
//! exchanges one turn. The `TutorService` trait is the seam the runtime is
//! generic over, so tests can script the remote side.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Payload of a successful turn exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnPayload {
    pub output: String,
    pub choices: Vec<String>,
}

/// Remote collaborator contract
#[async_trait]
pub trait TutorService: Send + Sync {
    /// Acquire the session token.
    async fn start_chat(&self) -> Result<String, RemoteError>;

    /// Exchange one turn within an established session.
    async fn send_message(&self, prompt: &str, session_id: &str)
        -> Result<TurnPayload, RemoteError>;
}

/// Remote failure with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
    /// Server-reported failure text, surfaced verbatim in the diagnostic
    /// turn when present.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Transport failure: connect, timeout, body read
    Network,
    /// Non-success HTTP status from the backend
    Server,
    /// Success status but a response shape we cannot use
    Protocol,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Protocol, message)
    }

    pub fn server(status: StatusCode, detail: Option<String>) -> Self {
        let message = match &detail {
            Some(d) => format!("server returned {status}: {d}"),
            None => format!("server returned {status}"),
        };
        Self {
            kind: RemoteErrorKind::Server,
            message,
            detail,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::network(err.to_string())
    }
}

// Wire types for the backend routes

#[derive(Debug, Deserialize)]
struct StartChatResponse {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    prompt: &'a str,
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    choices: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// reqwest-backed implementation of the tutor routes
pub struct HttpTutorService {
    client: Client,
    base_url: String,
}

impl HttpTutorService {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{route}", self.base_url)
    }
}

#[async_trait]
impl TutorService for HttpTutorService {
    async fn start_chat(&self) -> Result<String, RemoteError> {
        let response = self.client.get(self.url("start_chat")).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(RemoteError::server(status, body.detail));
        }

        let body: StartChatResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::protocol(format!("bad start_chat response: {e}")))?;

        match body.session_id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(RemoteError::protocol(
                "start_chat response missing session_id",
            )),
        }
    }

    async fn send_message(
        &self,
        prompt: &str,
        session_id: &str,
    ) -> Result<TurnPayload, RemoteError> {
        let response = self
            .client
            .post(self.url("send_message"))
            .json(&SendMessageRequest { prompt, session_id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(RemoteError::server(status, body.detail));
        }

        let body: SendMessageResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::protocol(format!("bad send_message response: {e}")))?;

        match body.output {
            Some(output) => Ok(TurnPayload {
                output,
                choices: body.choices,
            }),
            None => Err(RemoteError::protocol(
                "send_message response missing output",
            )),
        }
    }
}
