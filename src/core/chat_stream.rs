use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::message_log::StreamTag;
use super::session::ChatSession;

/// Events of one in-flight reply, delivered to the event loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    /// The whole reply received so far.
    Snapshot(String),
    /// The stream failed; carries a diagnostic, not user-facing text.
    Error(String),
    /// The stream ended normally with this complete reply.
    Done(String),
}

pub struct StreamParams {
    pub session: ChatSession,
    pub text: String,
    pub tag: StreamTag,
    pub cancel_token: CancellationToken,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, StreamTag)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, StreamTag)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Runs the exchange on its own task. Exactly one `Done` or `Error` is
    /// sent unless the token is cancelled first, in which case the task ends
    /// silently.
    pub fn spawn_stream(&self, params: StreamParams) -> tokio::task::JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                session,
                text,
                tag,
                cancel_token,
            } = params;

            let snapshot_tx = tx.clone();
            let exchange = session.send_message_stream(&text, move |snapshot| {
                let _ = snapshot_tx.send((StreamMessage::Snapshot(snapshot.to_string()), tag));
            });

            tokio::select! {
                result = exchange => {
                    let message = match result {
                        Ok(full_text) => StreamMessage::Done(full_text),
                        Err(e) => {
                            error!(session = session.id(), "chat error: {e}");
                            StreamMessage::Error(e.to_string())
                        }
                    };
                    let _ = tx.send((message, tag));
                }
                _ = cancel_token.cancelled() => {
                    debug!(session = session.id(), "stream cancelled");
                }
            }
        })
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, tag: StreamTag) {
        let _ = self.tx.send((message, tag));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::MessageId;
    use crate::core::session::SessionFactory;
    use crate::utils::test_utils::{ScriptedBackend, ScriptedReply};
    use std::sync::Arc;

    fn params(reply: ScriptedReply, cancel_token: CancellationToken) -> StreamParams {
        let factory = SessionFactory::new(Arc::new(ScriptedBackend::new(vec![reply])));
        StreamParams {
            session: factory.create_session("m1", "be terse"),
            text: "hi".to_string(),
            tag: StreamTag {
                generation: 7,
                message_id: MessageId::new(),
            },
            cancel_token,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<(StreamMessage, StreamTag)>) -> Vec<StreamMessage> {
        let mut out = Vec::new();
        while let Ok((message, tag)) = rx.try_recv() {
            assert_eq!(tag.generation, 7);
            out.push(message);
        }
        out
    }

    #[tokio::test]
    async fn successful_stream_emits_snapshots_then_done() {
        let (service, mut rx) = ChatStreamService::new();
        service
            .spawn_stream(params(
                ScriptedReply::chunks(["H", "el", "lo"]),
                CancellationToken::new(),
            ))
            .await
            .unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![
                StreamMessage::Snapshot("H".into()),
                StreamMessage::Snapshot("Hel".into()),
                StreamMessage::Snapshot("Hello".into()),
                StreamMessage::Done("Hello".into()),
            ]
        );
    }

    #[tokio::test]
    async fn failing_stream_ends_with_error() {
        let (service, mut rx) = ChatStreamService::new();
        service
            .spawn_stream(params(
                ScriptedReply::fail_after(["H"], "connection reset"),
                CancellationToken::new(),
            ))
            .await
            .unwrap();

        let messages = drain(&mut rx);
        assert_eq!(messages[0], StreamMessage::Snapshot("H".into()));
        assert!(matches!(&messages[1], StreamMessage::Error(e) if e.contains("connection reset")));
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn open_failure_is_reported_as_error() {
        let (service, mut rx) = ChatStreamService::new();
        service
            .spawn_stream(params(
                ScriptedReply::refuse("API key not valid"),
                CancellationToken::new(),
            ))
            .await
            .unwrap();

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], StreamMessage::Error(_)));
    }

    #[tokio::test]
    async fn cancellation_ends_a_hung_stream_silently() {
        let (service, mut rx) = ChatStreamService::new();
        let token = CancellationToken::new();
        let handle = service.spawn_stream(params(ScriptedReply::hang(["partial"]), token.clone()));

        tokio::task::yield_now().await;
        token.cancel();
        handle.await.unwrap();

        let messages = drain(&mut rx);
        assert!(messages
            .iter()
            .all(|m| matches!(m, StreamMessage::Snapshot(_))));
    }
}
