//! State machine for one outgoing exchange.
//!
//! `Idle -> Sending -> Streaming -> (Completed | Failed) -> Idle`. The
//! terminal states are transient: the machine reports them as the outcome of
//! the exchange and is immediately idle again, so the send control re-enables
//! on every path.

use super::message_log::StreamTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangePhase {
    #[default]
    Idle,
    /// User turn accepted; placeholder not yet attached.
    Sending,
    Streaming { tag: StreamTag },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Completed,
    Failed,
    /// The log was replaced while the stream was in flight.
    Abandoned,
}

#[derive(Debug, Default)]
pub struct Exchange {
    phase: ExchangePhase,
    last_outcome: Option<ExchangeOutcome>,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn last_outcome(&self) -> Option<ExchangeOutcome> {
        self.last_outcome
    }

    pub fn is_idle(&self) -> bool {
        self.phase == ExchangePhase::Idle
    }

    pub fn is_sending(&self) -> bool {
        !self.is_idle()
    }

    /// Whether the send control is enabled for `input`.
    pub fn can_send(&self, input: &str) -> bool {
        self.is_idle() && !input.trim().is_empty()
    }

    pub fn current_tag(&self) -> Option<StreamTag> {
        match self.phase {
            ExchangePhase::Streaming { tag } => Some(tag),
            _ => None,
        }
    }

    /// Idle -> Sending. Returns `false` if an exchange is already running.
    pub fn begin(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.phase = ExchangePhase::Sending;
        true
    }

    /// Sending -> Streaming.
    pub fn start_streaming(&mut self, tag: StreamTag) -> bool {
        if self.phase != ExchangePhase::Sending {
            return false;
        }
        self.phase = ExchangePhase::Streaming { tag };
        true
    }

    pub fn complete(&mut self, tag: StreamTag) -> bool {
        self.finish(tag, ExchangeOutcome::Completed)
    }

    pub fn fail(&mut self, tag: StreamTag) -> bool {
        self.finish(tag, ExchangeOutcome::Failed)
    }

    /// Drops whatever exchange is running, e.g. because the chat restarted.
    pub fn abandon(&mut self) {
        if !self.is_idle() {
            self.last_outcome = Some(ExchangeOutcome::Abandoned);
        }
        self.phase = ExchangePhase::Idle;
    }

    fn finish(&mut self, tag: StreamTag, outcome: ExchangeOutcome) -> bool {
        if self.current_tag() != Some(tag) {
            return false;
        }
        self.last_outcome = Some(outcome);
        self.phase = ExchangePhase::Idle;
        true
    }
}
