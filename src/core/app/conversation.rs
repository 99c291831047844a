use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{App, Focus, SidebarLayout, STREAM_FAILURE_MESSAGE};
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::exchange::ExchangePhase;
use crate::core::message::Message;
use crate::core::message_log::StreamTag;

impl App {
    /// Replaces the session and the log for the current configuration.
    ///
    /// Any stream still running is cancelled and the send state returns to
    /// idle, so the input is usable immediately.
    pub fn start_new_chat(&mut self) {
        self.cancel_current_stream();
        self.exchange.abandon();

        let config = self.config.get();
        self.session = self
            .factory
            .create_session(&config.model, &config.system_instruction);
        self.reset_log();
    }

    /// "Apply & restart": a new chat, plus closing the overlay panel.
    pub fn restart(&mut self) {
        self.start_new_chat();
        if self.ui.layout() == SidebarLayout::Overlay {
            self.ui.set_focus(Focus::Input);
        }
        self.ui.set_status("Chat restarted");
    }

    pub(super) fn reset_log(&mut self) {
        let config = self.config.get();
        let greeting = Message::model(config.greeting());
        let generation = self.log.reset(greeting);
        self.ui.set_input_placeholder(&config.name);
        self.ui.follow_log();
        debug!(
            session = self.session.id(),
            generation,
            model = %self.session.model(),
            "started new chat"
        );
    }

    pub fn cancel_current_stream(&mut self) {
        if let Some(token) = self.stream_cancel_token.take() {
            token.cancel();
        }
    }

    /// Takes the input box content for sending, at the moment Enter is
    /// pressed.
    ///
    /// Returns `None` while another exchange runs or when the input is
    /// blank. Otherwise the exchange moves to Sending and the input is
    /// cleared, so keys typed afterwards start the next message.
    pub fn take_input_for_send(&mut self) -> Option<String> {
        let text = self.ui.get_input_text();
        if !self.exchange.can_send(&text) || !self.exchange.begin() {
            return None;
        }
        self.ui.clear_input();
        self.ui.clear_status();
        Some(text)
    }

    /// Appends the user turn and the reply placeholder for text taken by
    /// [`App::take_input_for_send`], and returns what the stream needs.
    ///
    /// Does nothing unless the exchange is in the Sending phase; a restart
    /// in between drops the message.
    pub fn send_message(&mut self, text: String) -> Option<StreamParams> {
        if self.exchange.phase() != ExchangePhase::Sending {
            debug!("dropping submit outside the sending phase");
            return None;
        }

        self.log.push(Message::user(text.clone()));
        let Some(tag) = self.log.push_placeholder() else {
            self.exchange.abandon();
            return None;
        };
        self.exchange.start_streaming(tag);

        let cancel_token = CancellationToken::new();
        self.stream_cancel_token = Some(cancel_token.clone());
        self.ui.pulse_start = Instant::now();
        self.ui.follow_log();

        debug!(session = self.session.id(), generation = tag.generation, "sending message");
        Some(StreamParams {
            session: self.session.clone(),
            text,
            tag,
            cancel_token,
        })
    }

    /// Enter followed by its queued submit, in one step.
    #[cfg(test)]
    pub fn submit_message(&mut self) -> Option<StreamParams> {
        let text = self.take_input_for_send()?;
        self.send_message(text)
    }

    /// Applies one stream event. Events for a placeholder that is no longer
    /// open (the chat restarted, or the stream already ended) are dropped and
    /// `false` is returned.
    pub fn apply_stream_message(&mut self, message: StreamMessage, tag: StreamTag) -> bool {
        if !self.log.is_current(tag) {
            debug!(generation = tag.generation, "dropping stale stream event");
            return false;
        }

        match message {
            StreamMessage::Snapshot(text) => {
                self.log.apply_snapshot(tag, &text);
            }
            StreamMessage::Done(text) => {
                self.log.finalize(tag, &text);
                self.exchange.complete(tag);
                self.stream_cancel_token = None;
            }
            StreamMessage::Error(_) => {
                self.log.fail(tag, STREAM_FAILURE_MESSAGE);
                self.exchange.fail(tag);
                self.stream_cancel_token = None;
            }
        }
        self.ui.follow_log();
        true
    }

    /// Text of the newest finished assistant reply, for copying.
    pub fn last_reply_text(&self) -> Option<String> {
        self.log
            .last_finished_reply()
            .map(|message| message.content.clone())
            .filter(|content| !content.is_empty())
    }
}
