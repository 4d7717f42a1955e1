//! Scripted and failing transports.

use async_trait::async_trait;
use parking_lot::Mutex;
use procgate_client::{Transport, TransportError};
use std::collections::VecDeque;
use std::sync::Arc;

/// One request captured by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    /// SOAP action the client dispatched under.
    pub action: String,
    /// Exact request envelope as sent.
    pub envelope: String,
}

/// Transport answering from a queue of canned reply envelopes, recording
/// every request it sees.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<SentRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw reply envelope.
    pub fn push_reply(&self, envelope: impl Into<String>) {
        self.replies.lock().push_back(envelope.into());
    }

    /// Queue a text-result reply for `operation`.
    pub fn push_text(&self, operation: &str, value: &str) {
        self.push_reply(crate::text_reply(operation, value));
    }

    /// Queue a string-array reply for `operation`.
    pub fn push_list(&self, operation: &str, items: &[&str]) {
        self.push_reply(crate::list_reply(operation, items));
    }

    /// Queue an empty acknowledgement for `operation`.
    pub fn push_empty(&self, operation: &str) {
        self.push_reply(crate::empty_reply(operation));
    }

    /// Queue a fault reply.
    pub fn push_fault(&self, code: &str, message: &str, detail: Option<&str>) {
        self.push_reply(crate::fault_reply(code, message, detail));
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<SentRequest> {
        self.requests.lock().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<SentRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, action: &str, envelope: &str) -> Result<String, TransportError> {
        self.requests.lock().push(SentRequest {
            action: action.to_string(),
            envelope: envelope.to_string(),
        });
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::Http("scripted transport exhausted".to_string()))
    }
}

/// How a [`FailingTransport`] fails.
#[derive(Debug, Clone)]
pub enum FailureMode {
    /// Connection refused / unreachable endpoint.
    Connect(String),
    /// Binding timeout elapsed.
    Timeout,
    /// Non-SOAP HTTP status.
    Status(u16),
}

/// Transport whose every call fails the same way.
#[derive(Debug, Clone)]
pub struct FailingTransport {
    mode: FailureMode,
}

impl FailingTransport {
    pub fn new(mode: FailureMode) -> Self {
        Self { mode }
    }

    /// Shorthand for an unreachable endpoint.
    pub fn unreachable() -> Self {
        Self::new(FailureMode::Connect("connection refused".to_string()))
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, _action: &str, _envelope: &str) -> Result<String, TransportError> {
        Err(match &self.mode {
            FailureMode::Connect(reason) => TransportError::Connect(reason.clone()),
            FailureMode::Timeout => TransportError::Timeout,
            FailureMode::Status(status) => TransportError::Status(*status),
        })
    }
}
