//! Provider sessions.
//!
//! A [`ChatSession`] is bound to one model and one system instruction for its
//! whole life. Creating one never touches the network; problems with the
//! credential or the model only show up when the first message is sent.

use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tracing::debug;

use super::message::Role;

/// Failure while opening or reading a provider stream.
#[derive(Debug)]
pub enum TransportError {
    /// The HTTP request could not be sent or its body could not be read.
    Request(reqwest::Error),

    /// The provider answered with an error, either as a non-success status or
    /// inside the stream.
    Api {
        status: Option<u16>,
        message: String,
    },

    /// A stream payload could not be understood.
    Decode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request(source) => write!(f, "request failed: {source}"),
            TransportError::Api {
                status: Some(status),
                message,
            } => write!(f, "API error ({status}): {message}"),
            TransportError::Api {
                status: None,
                message,
            } => write!(f, "API error: {message}"),
            TransportError::Decode(detail) => write!(f, "invalid stream payload: {detail}"),
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TransportError::Request(source) => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        TransportError::Request(value)
    }
}

/// A completed turn the provider should see as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

impl HistoryTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: String,
    /// Prior turns followed by the new user turn.
    pub contents: Vec<HistoryTurn>,
}

/// Text deltas of one generation, in arrival order.
pub type TextStream = BoxStream<'static, Result<String, TransportError>>;

/// The hosted model, seen as "open a generation and read its text".
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<TextStream, TransportError>;
}

struct SessionInner {
    id: u64,
    model: String,
    system_instruction: String,
    backend: Arc<dyn ChatBackend>,
    history: Mutex<Vec<HistoryTurn>>,
}

/// Handle to one provider-side conversation. Cloning shares the conversation.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.inner.id)
            .field("model", &self.inner.model)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn model(&self) -> &str {
        &self.inner.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.inner.system_instruction
    }

    pub fn history(&self) -> Vec<HistoryTurn> {
        self.lock_history().clone()
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, Vec<HistoryTurn>> {
        // History is only ever replaced whole, so a poisoned guard still
        // holds a consistent value.
        self.inner
            .history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sends `text` and reports the reply as it grows.
    ///
    /// `on_snapshot` receives the full accumulated reply after every
    /// non-empty chunk, never a bare fragment. On success the complete reply
    /// is returned and the exchange joins the session history; a failed
    /// exchange leaves the history untouched.
    pub async fn send_message_stream<F>(
        &self,
        text: &str,
        mut on_snapshot: F,
    ) -> Result<String, TransportError>
    where
        F: FnMut(&str) + Send,
    {
        let mut contents = self.history();
        contents.push(HistoryTurn::new(Role::User, text));

        let request = GenerateRequest {
            model: self.inner.model.clone(),
            system_instruction: self.inner.system_instruction.clone(),
            contents,
        };

        debug!(session = self.inner.id, model = %self.inner.model, "opening stream");
        let mut stream = self.inner.backend.stream_generate(request).await?;

        let mut full_text = String::new();
        while let Some(delta) = stream.next().await {
            let delta = delta?;
            if delta.is_empty() {
                continue;
            }
            full_text.push_str(&delta);
            on_snapshot(&full_text);
        }

        debug!(
            session = self.inner.id,
            chars = full_text.len(),
            "stream finished"
        );

        let mut history = self.lock_history();
        history.push(HistoryTurn::new(Role::User, text));
        history.push(HistoryTurn::new(Role::Model, full_text.clone()));
        Ok(full_text)
    }
}

/// Opens sessions against one backend.
pub struct SessionFactory {
    backend: Arc<dyn ChatBackend>,
    next_id: AtomicU64,
}

impl SessionFactory {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            next_id: AtomicU64::new(1),
        }
    }

    /// Binds a new session to `model` and `system_instruction`. Never fails.
    pub fn create_session(&self, model: &str, system_instruction: &str) -> ChatSession {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, model, "session created");
        ChatSession {
            inner: Arc::new(SessionInner {
                id,
                model: model.to_string(),
                system_instruction: system_instruction.to_string(),
                backend: Arc::clone(&self.backend),
                history: Mutex::new(Vec::new()),
            }),
        }
    }
}
