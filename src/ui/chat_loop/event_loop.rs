//! Event polling, dispatching, and UI rendering loop.
//!
//! Terminal input arrives from a reader task, stream events from
//! [`ChatStreamService`]; both become [`AppAction`]s that are applied in
//! batches. Commands produced by the actions (spawning a stream, copying to
//! the clipboard) run here, outside the app lock.

use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::prelude::Size;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::app::actions::apply_action;
use crate::core::app::{
    apply_actions, App, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope,
    AppCommand,
};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::message_log::StreamTag;
use crate::ui::renderer::ui;
use crate::utils::clipboard::copy_to_clipboard;

use super::keybindings::{resolve_key, scroll_for_empty_input, to_textarea_input, KeyRoute};
use super::lifecycle::{restore_terminal, setup_terminal, SharedTerminal};
use super::AppHandle;

const MAX_FPS: u64 = 60;
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

struct EventProcessingOutcome {
    events_processed: bool,
    request_redraw: bool,
}

async fn is_exit_requested(app: &AppHandle) -> bool {
    app.read(|app| app.ui.exit_requested).await
}

async fn current_terminal_size(terminal: &SharedTerminal) -> Size {
    let guard = terminal.lock().await;
    guard.size().unwrap_or_default()
}

async fn try_draw_frame(
    app: &AppHandle,
    terminal: &SharedTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut terminal_guard = terminal.lock().await;
    (app.update(|app| terminal_guard.draw(|f| ui(f, app))).await)?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

async fn process_ui_events(
    app: &AppHandle,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
    term_size: Size,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        request_redraw: false,
    };
    let ctx = AppActionContext {
        term_width: term_size.width,
        term_height: term_size.height,
    };

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                route_keyboard_event(app, dispatcher, key, ctx).await;
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                handle_paste_event(app, ctx, &text).await;
            }
            UiEvent::Crossterm(_) => {}
        }
    }

    if outcome.events_processed {
        outcome.request_redraw = true;
    }
    outcome
}

async fn route_keyboard_event(
    app: &AppHandle,
    dispatcher: &AppActionDispatcher,
    key: KeyEvent,
    ctx: AppActionContext,
) {
    let route = app.read(|app| resolve_key(app.ui.focus, &key)).await;
    match route {
        KeyRoute::Dispatch(action) => dispatcher.dispatch_many([action], ctx),
        KeyRoute::Submit => {
            if let Some(message) = app.update(|app| app.take_input_for_send()).await {
                dispatcher.dispatch_many([AppAction::SubmitMessage { message }], ctx);
            }
        }
        KeyRoute::InsertNewline => {
            app.update(|app| app.ui.apply_input_edit(|ta| ta.insert_newline()))
                .await;
        }
        KeyRoute::EditInput => {
            let scroll = app
                .update(|app| {
                    if app.ui.get_input_text().is_empty() {
                        if let Some(action) = scroll_for_empty_input(&key) {
                            return Some(action);
                        }
                    }
                    app.ui.apply_input_edit(|ta| {
                        ta.input(to_textarea_input(key));
                    });
                    None
                })
                .await;
            if let Some(action) = scroll {
                dispatcher.dispatch_many([action], ctx);
            }
        }
        KeyRoute::EditField => {
            app.update(|app| {
                app.edit_focused_field(to_textarea_input(key));
            })
            .await;
        }
    }
}

/// Normalizes line endings, expands tabs and drops other control characters.
pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

/// Pastes are applied in place, like typed keys, so they keep their order
/// relative to the keys around them.
async fn handle_paste_event(app: &AppHandle, ctx: AppActionContext, text: &str) {
    let sanitized_text = sanitize_pasted_text(text);
    if sanitized_text.is_empty() {
        return;
    }
    let action = AppAction::InsertIntoInput {
        text: sanitized_text,
    };
    app.update(|app| apply_action(app, action, ctx)).await;
}

fn stream_action(message: StreamMessage, tag: StreamTag) -> AppAction {
    match message {
        StreamMessage::Snapshot(text) => AppAction::StreamSnapshot { text, tag },
        StreamMessage::Error(message) => AppAction::StreamErrored { message, tag },
        StreamMessage::Done(text) => AppAction::StreamCompleted { text, tag },
    }
}

/// Drains pending stream events into actions. Consecutive snapshots of one
/// stream collapse to the newest, since each carries the full text so far.
fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, StreamTag)>,
    ctx: AppActionContext,
) -> bool {
    let mut actions: Vec<AppAction> = Vec::new();

    while let Ok((message, tag)) = rx.try_recv() {
        let action = stream_action(message, tag);
        if let (
            AppAction::StreamSnapshot { tag: new_tag, .. },
            Some(AppAction::StreamSnapshot { tag: last_tag, .. }),
        ) = (&action, actions.last())
        {
            if new_tag == last_tag {
                actions.pop();
            }
        }
        actions.push(action);
    }

    if actions.is_empty() {
        return false;
    }
    dispatcher.dispatch_many(actions, ctx);
    true
}

fn spawn_clipboard_copy(dispatcher: AppActionDispatcher, text: String) {
    tokio::task::spawn_blocking(move || {
        let message = match copy_to_clipboard(&text) {
            Ok(()) => "Copied reply to clipboard".to_string(),
            Err(err) => {
                warn!("clipboard copy failed: {err}");
                err.to_string()
            }
        };
        dispatcher.dispatch_many([AppAction::SetStatus { message }], AppActionContext::default());
    });
}

async fn drain_action_queue(
    app: &AppHandle,
    dispatcher: &AppActionDispatcher,
    stream_service: &ChatStreamService,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    let commands = app.update(|app| apply_actions(app, pending)).await;
    for cmd in commands {
        match cmd {
            AppCommand::SpawnStream(params) => {
                stream_service.spawn_stream(params);
            }
            AppCommand::CopyToClipboard(text) => {
                spawn_clipboard_copy(dispatcher.clone(), text);
            }
        }
    }
    true
}

async fn expire_status(app: &AppHandle, dispatcher: &AppActionDispatcher) {
    let expired = app
        .read(|app| {
            app.ui
                .status_set_at
                .is_some_and(|set_at| set_at.elapsed() >= STATUS_TIMEOUT)
        })
        .await;
    if expired {
        dispatcher.dispatch_many([AppAction::ClearStatus], AppActionContext::default());
    }
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

/// Runs the full-screen chat until the user quits.
pub async fn run_chat(app: App) -> Result<(), Box<dyn Error>> {
    let app = AppHandle::new(app);

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let action_dispatcher = AppActionDispatcher::new(action_tx);

    let terminal = setup_terminal()?;
    let (stream_service, mut rx) = ChatStreamService::new();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;
    let mut indicator_visible = false;
    let mut last_indicator_frame = Instant::now() - frame_duration;

    debug!("chat loop started");

    let result = 'main_loop: loop {
        if is_exit_requested(&app).await {
            break 'main_loop Ok(());
        }

        if let Err(err) = try_draw_frame(
            &app,
            &terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await
        {
            break 'main_loop Err(err.into());
        }

        let term_size = current_terminal_size(&terminal).await;
        let ctx = AppActionContext {
            term_width: term_size.width,
            term_height: term_size.height,
        };

        let event_outcome =
            process_ui_events(&app, &mut event_rx, &action_dispatcher, term_size).await;
        if event_outcome.request_redraw {
            request_redraw = true;
        }

        let received_any = process_stream_updates(&action_dispatcher, &mut rx, ctx);
        if received_any {
            request_redraw = true;
        }

        expire_status(&app, &action_dispatcher).await;

        let actions_applied =
            drain_action_queue(&app, &action_dispatcher, &stream_service, &mut action_rx).await;
        if actions_applied {
            request_redraw = true;
        }

        let indicator_now = app.read(|app| app.exchange.is_sending()).await;
        if indicator_now != indicator_visible {
            indicator_visible = indicator_now;
            request_redraw = true;
        }
        if indicator_now {
            let now = Instant::now();
            if now.duration_since(last_indicator_frame) >= frame_duration {
                request_redraw = true;
                last_indicator_frame = now;
            }
        }

        let idle = !event_outcome.events_processed && !received_any && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader_handle.abort();
    app.update(|app| app.cancel_current_stream()).await;
    restore_terminal(&terminal).await?;
    debug!("chat loop finished");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::Focus;
    use crate::core::message::Role;
    use crate::utils::test_utils::create_test_app;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn new_dispatcher() -> (
        AppActionDispatcher,
        mpsc::UnboundedReceiver<AppActionEnvelope>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AppActionDispatcher::new(tx), rx)
    }

    fn ctx() -> AppActionContext {
        AppActionContext {
            term_width: 80,
            term_height: 24,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>) -> Vec<AppActionEnvelope> {
        let mut out = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            out.push(envelope);
        }
        out
    }

    #[test]
    fn sanitize_pasted_text_normalizes_line_endings_and_tabs() {
        assert_eq!(sanitize_pasted_text("a\r\nb\rc\td"), "a\nb\nc    d");
        assert_eq!(sanitize_pasted_text("x\u{7}y"), "xy");
    }

    #[test]
    fn stream_updates_collapse_consecutive_snapshots() {
        let (service, mut rx) = ChatStreamService::new();
        let mut app = create_test_app();
        app.ui.set_input_text("Hi");
        let tag = app.submit_message().unwrap().tag;

        service.send_for_test(StreamMessage::Snapshot("H".into()), tag);
        service.send_for_test(StreamMessage::Snapshot("Hel".into()), tag);
        service.send_for_test(StreamMessage::Snapshot("Hello".into()), tag);
        service.send_for_test(StreamMessage::Done("Hello".into()), tag);

        let (dispatcher, mut action_rx) = new_dispatcher();
        assert!(process_stream_updates(&dispatcher, &mut rx, ctx()));

        let envelopes = drain(&mut action_rx);
        assert_eq!(envelopes.len(), 2);
        assert!(matches!(
            &envelopes[0].action,
            AppAction::StreamSnapshot { text, .. } if text == "Hello"
        ));

        let commands = apply_actions(&mut app, envelopes);
        assert!(commands.is_empty());
        assert_eq!(app.log.last().unwrap().content, "Hello");
        assert!(app.exchange.is_idle());
    }

    #[test]
    fn no_stream_updates_means_nothing_dispatched() {
        let (_service, mut rx) = ChatStreamService::new();
        let (dispatcher, mut action_rx) = new_dispatcher();
        assert!(!process_stream_updates(&dispatcher, &mut rx, ctx()));
        assert!(drain(&mut action_rx).is_empty());
    }

    async fn press_keys(app: &AppHandle, dispatcher: &AppActionDispatcher, keys: &[KeyCode]) {
        for code in keys {
            route_keyboard_event(app, dispatcher, KeyEvent::new(*code, KeyModifiers::NONE), ctx())
                .await;
        }
    }

    #[tokio::test]
    async fn enter_in_input_dispatches_submit() {
        let app = AppHandle::new(create_test_app());
        app.update(|app| app.ui.set_input_text("hello")).await;
        let (dispatcher, mut action_rx) = new_dispatcher();

        route_keyboard_event(
            &app,
            &dispatcher,
            KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE),
            ctx(),
        )
        .await;

        let envelopes = drain(&mut action_rx);
        assert_eq!(envelopes.len(), 1);
        assert!(matches!(
            &envelopes[0].action,
            AppAction::SubmitMessage { message } if message == "hello"
        ));
        assert_eq!(app.read(|app| app.ui.get_input_text()).await, "");
    }

    #[tokio::test]
    async fn keys_after_enter_start_the_next_message() {
        let app = AppHandle::new(create_test_app());
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (service, _stream_rx) = ChatStreamService::new();

        press_keys(
            &app,
            &dispatcher,
            &[
                KeyCode::Char('h'),
                KeyCode::Char('i'),
                KeyCode::Enter,
                KeyCode::Char('x'),
            ],
        )
        .await;
        assert!(drain_action_queue(&app, &dispatcher, &service, &mut action_rx).await);

        let (sent, input) = app
            .read(|app| {
                let sent = app
                    .log
                    .messages()
                    .iter()
                    .rev()
                    .find(|message| message.role == Role::User)
                    .map(|message| message.content.clone());
                (sent, app.ui.get_input_text())
            })
            .await;
        assert_eq!(sent.as_deref(), Some("hi"));
        assert_eq!(input, "x");
    }

    #[tokio::test]
    async fn second_enter_while_sending_keeps_the_new_text() {
        let app = AppHandle::new(create_test_app());
        let (dispatcher, mut action_rx) = new_dispatcher();

        press_keys(
            &app,
            &dispatcher,
            &[
                KeyCode::Char('a'),
                KeyCode::Enter,
                KeyCode::Char('b'),
                KeyCode::Enter,
            ],
        )
        .await;

        assert_eq!(drain(&mut action_rx).len(), 1);
        assert_eq!(app.read(|app| app.ui.get_input_text()).await, "b");
    }

    #[tokio::test]
    async fn paste_keeps_its_place_among_typed_keys() {
        let app = AppHandle::new(create_test_app());
        let (dispatcher, mut action_rx) = new_dispatcher();

        press_keys(&app, &dispatcher, &[KeyCode::Char('a')]).await;
        handle_paste_event(&app, ctx(), "b").await;
        press_keys(&app, &dispatcher, &[KeyCode::Char('c'), KeyCode::Enter]).await;

        let envelopes = drain(&mut action_rx);
        assert!(matches!(
            &envelopes[..],
            [AppActionEnvelope { action: AppAction::SubmitMessage { message }, .. }] if message == "abc"
        ));
    }

    #[tokio::test]
    async fn shift_enter_inserts_a_newline_without_sending() {
        let app = AppHandle::new(create_test_app());
        app.update(|app| app.ui.set_input_text("line one")).await;
        let (dispatcher, mut action_rx) = new_dispatcher();

        route_keyboard_event(
            &app,
            &dispatcher,
            KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT),
            ctx(),
        )
        .await;

        assert!(drain(&mut action_rx).is_empty());
        let text = app.read(|app| app.ui.get_input_text()).await;
        assert_eq!(text, "line one\n");
    }

    #[tokio::test]
    async fn typing_reaches_the_focused_editor() {
        let app = AppHandle::new(create_test_app());
        let (dispatcher, _rx) = new_dispatcher();

        for ch in "hey".chars() {
            route_keyboard_event(
                &app,
                &dispatcher,
                KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE),
                ctx(),
            )
            .await;
        }
        assert_eq!(app.read(|app| app.ui.get_input_text()).await, "hey");

        app.update(|app| app.ui.set_focus(Focus::Name)).await;
        route_keyboard_event(
            &app,
            &dispatcher,
            KeyEvent::new(KeyCode::Char('!'), KeyModifiers::NONE),
            ctx(),
        )
        .await;
        assert_eq!(app.read(|app| app.config.get().name.clone()).await, "Helper!");
    }

    #[tokio::test]
    async fn home_on_empty_input_scrolls_to_top() {
        let app = AppHandle::new(create_test_app());
        let (dispatcher, mut action_rx) = new_dispatcher();

        route_keyboard_event(
            &app,
            &dispatcher,
            KeyEvent::new(KeyCode::Home, KeyModifiers::NONE),
            ctx(),
        )
        .await;

        let envelopes = drain(&mut action_rx);
        assert!(matches!(envelopes[0].action, AppAction::ScrollToTop));
    }

    #[tokio::test]
    async fn paste_is_sanitized_into_the_input() {
        let app = AppHandle::new(create_test_app());
        handle_paste_event(&app, ctx(), "pasted\r\ntext").await;
        assert_eq!(
            app.read(|app| app.ui.get_input_text()).await,
            "pasted\ntext"
        );
    }

    #[tokio::test]
    async fn submit_through_the_queue_spawns_a_stream() {
        let app = AppHandle::new(create_test_app());
        app.update(|app| app.ui.set_input_text("hello")).await;
        let (dispatcher, mut action_rx) = new_dispatcher();
        let (service, mut stream_rx) = ChatStreamService::new();

        press_keys(&app, &dispatcher, &[KeyCode::Enter]).await;
        assert!(drain_action_queue(&app, &dispatcher, &service, &mut action_rx).await);

        // The default scripted backend refuses every request.
        let (message, tag) = stream_rx.recv().await.unwrap();
        assert!(matches!(message, StreamMessage::Error(_)));
        assert!(app.read(|app| app.log.is_current(tag)).await);
    }
}
