#[cfg(test)]
use std::collections::VecDeque;
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use futures_util::stream::{self, StreamExt};

#[cfg(test)]
use crate::core::app::App;
#[cfg(test)]
use crate::core::config::AssistantConfig;
#[cfg(test)]
use crate::core::session::{
    ChatBackend, GenerateRequest, SessionFactory, TextStream, TransportError,
};
#[cfg(test)]
use crate::ui::theme::Theme;

/// How the scripted provider answers one request.
#[cfg(test)]
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Yields the chunks, then ends normally.
    Chunks(Vec<String>),
    /// Yields the chunks, then fails with an API error.
    FailAfter(Vec<String>, String),
    /// Refuses to open the stream at all.
    Refuse(String),
    /// Yields the chunks, then never ends.
    Hang(Vec<String>),
}

#[cfg(test)]
fn owned<I, S>(chunks: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    chunks.into_iter().map(Into::into).collect()
}

#[cfg(test)]
impl ScriptedReply {
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedReply::Chunks(owned(chunks))
    }

    pub fn fail_after<I, S>(chunks: I, error: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedReply::FailAfter(owned(chunks), error.to_string())
    }

    pub fn refuse(error: &str) -> Self {
        ScriptedReply::Refuse(error.to_string())
    }

    pub fn hang<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedReply::Hang(owned(chunks))
    }
}

/// Provider stand-in that replays canned replies and records requests.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

#[cfg(test)]
impl ScriptedBackend {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
fn api_error(message: String) -> TransportError {
    TransportError::Api {
        status: None,
        message,
    }
}

#[cfg(test)]
#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<TextStream, TransportError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::refuse("no scripted reply left"));

        let stream: TextStream = match reply {
            ScriptedReply::Chunks(chunks) => stream::iter(chunks.into_iter().map(Ok)).boxed(),
            ScriptedReply::FailAfter(chunks, error) => stream::iter(chunks.into_iter().map(Ok))
                .chain(stream::once(async move { Err(api_error(error)) }))
                .boxed(),
            ScriptedReply::Refuse(error) => return Err(api_error(error)),
            ScriptedReply::Hang(chunks) => stream::iter(chunks.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed(),
        };
        Ok(stream)
    }
}

#[cfg(test)]
pub fn test_config() -> AssistantConfig {
    AssistantConfig {
        name: "Helper".to_string(),
        model: "m1".to_string(),
        system_instruction: "be terse".to_string(),
    }
}

#[cfg(test)]
pub fn create_test_app_with_backend(backend: Arc<ScriptedBackend>) -> App {
    App::new(
        test_config(),
        SessionFactory::new(backend),
        Theme::dark_default(),
    )
}

#[cfg(test)]
pub fn create_test_app() -> App {
    create_test_app_with_backend(Arc::new(ScriptedBackend::default()))
}
