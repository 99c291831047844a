use tracing::debug;

use super::{App, AppAction, AppCommand};
use crate::core::chat_stream::StreamMessage;

pub(super) fn handle_streaming_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::StreamSnapshot { text, tag } => {
            app.apply_stream_message(StreamMessage::Snapshot(text), tag);
            None
        }
        AppAction::StreamErrored { message, tag } => {
            app.apply_stream_message(StreamMessage::Error(message), tag);
            None
        }
        AppAction::StreamCompleted { text, tag } => {
            app.apply_stream_message(StreamMessage::Done(text), tag);
            None
        }
        AppAction::SubmitMessage { message } => {
            app.send_message(message).map(AppCommand::SpawnStream)
        }
        AppAction::RestartChat => {
            if app.has_stream_in_flight() {
                debug!("restart cancels the reply in flight");
            }
            app.restart();
            None
        }
        _ => unreachable!("non-streaming action routed to streaming handler"),
    }
}
