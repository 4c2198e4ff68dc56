//! Scripted tutor service for tests
//!
//! Queues canned exchange results and records every prompt sent, so runtime
//! tests can drive full submission cycles without real I/O.

use crate::remote::{RemoteError, TurnPayload, TutorService};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;

pub struct ScriptedTutor {
    start_result: Mutex<Option<Result<String, RemoteError>>>,
    replies: Mutex<VecDeque<Result<TurnPayload, RemoteError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedTutor {
    /// A tutor whose session establishment succeeds.
    pub fn new() -> Self {
        Self {
            start_result: Mutex::new(Some(Ok("test-session".to_string()))),
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A tutor whose session establishment fails.
    pub fn with_failing_start() -> Self {
        Self {
            start_result: Mutex::new(Some(Err(RemoteError::network("connection refused")))),
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, output: &str, choices: Vec<&str>) {
        self.replies.lock().unwrap().push_back(Ok(TurnPayload {
            output: output.to_string(),
            choices: choices.into_iter().map(str::to_string).collect(),
        }));
    }

    pub fn queue_failure(&self, error: RemoteError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_failure_with_detail(&self, detail: &str) {
        self.queue_failure(RemoteError::server(
            StatusCode::TOO_MANY_REQUESTS,
            Some(detail.to_string()),
        ));
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for ScriptedTutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TutorService for ScriptedTutor {
    async fn start_chat(&self) -> Result<String, RemoteError> {
        self.start_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(RemoteError::network("start_chat called twice")))
    }

    async fn send_message(
        &self,
        prompt: &str,
        _session_id: &str,
    ) -> Result<TurnPayload, RemoteError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::network("no scripted reply queued")))
    }
}
