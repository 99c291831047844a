//! Application state shared by the event loop and the renderer.
//!
//! [`App`] owns the configuration store, the active session, the message log
//! and the send state machine. It is only ever mutated from the event loop,
//! through [`actions::apply_actions`] or the keybinding handlers.

use tokio_util::sync::CancellationToken;

use crate::core::config::{AssistantConfig, ConfigStore};
use crate::core::exchange::Exchange;
use crate::core::message_log::MessageLog;
use crate::core::session::{ChatSession, SessionFactory};
use crate::ui::theme::Theme;

pub mod actions;
pub mod conversation;
pub mod settings;
pub mod ui_state;

pub use actions::{
    apply_actions, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope, AppCommand,
};
pub use ui_state::{Focus, SidebarLayout, UiState};

/// Shown in place of a reply whose stream failed, whatever the cause.
pub const STREAM_FAILURE_MESSAGE: &str =
    "Sorry, I encountered an error connecting to Gemini. Please check your API key and connection.";

pub struct App {
    pub config: ConfigStore,
    pub session: ChatSession,
    pub log: MessageLog,
    pub exchange: Exchange,
    pub ui: UiState,
    factory: SessionFactory,
    stream_cancel_token: Option<CancellationToken>,
}

impl App {
    /// Builds the app and opens the first chat for `config`.
    pub fn new(config: AssistantConfig, factory: SessionFactory, theme: Theme) -> Self {
        let session = factory.create_session(&config.model, &config.system_instruction);
        let mut ui = UiState::new(theme);
        ui.load_config_fields(&config.name, &config.system_instruction);

        let mut app = App {
            config: ConfigStore::new(config),
            session,
            log: MessageLog::new(),
            exchange: Exchange::new(),
            ui,
            factory,
            stream_cancel_token: None,
        };
        app.reset_log();
        app
    }

    pub fn request_exit(&mut self) {
        self.ui.exit_requested = true;
    }

    /// Name shown on assistant turns; follows the configuration live.
    pub fn assistant_name(&self) -> &str {
        &self.config.get().name
    }

    pub fn has_stream_in_flight(&self) -> bool {
        self.stream_cancel_token.is_some()
    }
}
