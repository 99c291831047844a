mod input;
mod streaming;

use tokio::sync::mpsc;

use super::App;
use crate::core::chat_stream::StreamParams;
use crate::core::message_log::StreamTag;

pub enum AppAction {
    StreamSnapshot {
        text: String,
        tag: StreamTag,
    },
    StreamErrored {
        message: String,
        tag: StreamTag,
    },
    StreamCompleted {
        text: String,
        tag: StreamTag,
    },
    SubmitMessage {
        message: String,
    },
    RestartChat,
    CopyLastReply,
    InsertIntoInput {
        text: String,
    },
    CycleFocus {
        forward: bool,
    },
    CycleModel {
        forward: bool,
    },
    ToggleSidebar,
    CloseSidebar,
    ScrollPageUp,
    ScrollPageDown,
    ScrollToTop,
    ScrollToBottom,
    SetStatus {
        message: String,
    },
    ClearStatus,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.tx.send(AppActionEnvelope {
                action,
                context: ctx,
            });
        }
    }
}

/// Side effects the event loop performs after actions are applied.
pub enum AppCommand {
    SpawnStream(StreamParams),
    CopyToClipboard(String),
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        if let Some(cmd) = apply_action(app, envelope.action, envelope.context) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Option<AppCommand> {
    if ctx.term_width > 0 && ctx.term_height > 0 {
        app.ui.last_term_size = ratatui::prelude::Size::new(ctx.term_width, ctx.term_height);
    }

    match action {
        AppAction::StreamSnapshot { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::StreamCompleted { .. }
        | AppAction::SubmitMessage { .. }
        | AppAction::RestartChat => streaming::handle_streaming_action(app, action),

        AppAction::CopyLastReply
        | AppAction::InsertIntoInput { .. }
        | AppAction::CycleFocus { .. }
        | AppAction::CycleModel { .. }
        | AppAction::ToggleSidebar
        | AppAction::CloseSidebar
        | AppAction::ScrollPageUp
        | AppAction::ScrollPageDown
        | AppAction::ScrollToTop
        | AppAction::ScrollToBottom
        | AppAction::SetStatus { .. }
        | AppAction::ClearStatus
        | AppAction::Quit => input::handle_input_action(app, action),
    }
}
