//! Ordered, append-only chat log.
//!
//! The log is replaced wholesale on restart. Each replacement bumps its
//! generation, and every stream carries the generation it was started
//! against, so output from a stream that outlived its log is dropped instead
//! of landing in the new conversation.

use super::message::{Message, MessageId};

/// Identifies the placeholder a stream feeds and the log generation it
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamTag {
    pub generation: u64,
    pub message_id: MessageId,
}

#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    generation: u64,
    open_stream: Option<StreamTag>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards every turn and starts a new generation seeded with `greeting`.
    pub fn reset(&mut self, greeting: Message) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.messages.clear();
        self.messages.push(greeting);
        self.open_stream = None;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn is_current(&self, tag: StreamTag) -> bool {
        self.open_stream == Some(tag)
    }

    /// Appends a finished turn.
    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Appends a loading assistant placeholder and opens a stream for it.
    ///
    /// Returns `None` while another stream is still open; only one turn may be
    /// loading at a time.
    pub fn push_placeholder(&mut self) -> Option<StreamTag> {
        if self.open_stream.is_some() {
            return None;
        }
        let id = self.push(Message::placeholder());
        let tag = StreamTag {
            generation: self.generation,
            message_id: id,
        };
        self.open_stream = Some(tag);
        Some(tag)
    }

    /// Replaces the open placeholder's content with a cumulative snapshot.
    ///
    /// The loading flag drops at the first non-empty snapshot. Returns `false`
    /// for stale tags.
    pub fn apply_snapshot(&mut self, tag: StreamTag, text: &str) -> bool {
        let Some(message) = self.open_message_mut(tag) else {
            return false;
        };
        message.content.clear();
        message.content.push_str(text);
        if !text.is_empty() {
            message.is_loading = false;
        }
        true
    }

    /// Freezes the placeholder with the stream's final text.
    pub fn finalize(&mut self, tag: StreamTag, text: &str) -> bool {
        self.close(tag, text, false)
    }

    /// Freezes the placeholder with `error_text`, discarding any partial
    /// reply, and marks it as an error turn.
    pub fn fail(&mut self, tag: StreamTag, error_text: &str) -> bool {
        self.close(tag, error_text, true)
    }

    fn close(&mut self, tag: StreamTag, text: &str, is_error: bool) -> bool {
        let Some(message) = self.open_message_mut(tag) else {
            return false;
        };
        message.content = text.to_string();
        message.is_loading = false;
        message.is_error = is_error;
        self.open_stream = None;
        true
    }

    fn open_message_mut(&mut self, tag: StreamTag) -> Option<&mut Message> {
        if !self.is_current(tag) {
            return None;
        }
        self.messages.iter_mut().rev().find(|m| m.id == tag.message_id)
    }

    /// Newest assistant turn whose stream has finished.
    pub fn last_finished_reply(&self) -> Option<&Message> {
        let open_id = self.open_stream.map(|tag| tag.message_id);
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_model() && Some(m.id) != open_id)
    }
}
