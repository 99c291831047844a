use super::{App, AppAction, AppCommand};
use crate::core::app::{Focus, SidebarLayout};

pub(super) fn handle_input_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::CopyLastReply => match app.last_reply_text() {
            Some(text) => Some(AppCommand::CopyToClipboard(text)),
            None => {
                app.ui.set_status("Nothing to copy yet");
                None
            }
        },
        AppAction::InsertIntoInput { text } => {
            if app.ui.focus == Focus::Input {
                app.ui.apply_input_edit(|ta| {
                    ta.insert_str(&text);
                });
            } else {
                paste_into_focused_field(app, &text);
            }
            None
        }
        AppAction::CycleFocus { forward } => {
            let next = if forward {
                app.ui.focus.next()
            } else {
                app.ui.focus.prev()
            };
            app.ui.set_focus(next);
            None
        }
        AppAction::CycleModel { forward } => {
            app.cycle_model(forward);
            None
        }
        AppAction::ToggleSidebar => {
            let closing = match app.ui.layout() {
                SidebarLayout::Overlay => app.ui.sidebar_open,
                SidebarLayout::Docked => app.ui.focus.is_config_field(),
            };
            app.ui
                .set_focus(if closing { Focus::Input } else { Focus::Name });
            None
        }
        AppAction::CloseSidebar => {
            app.ui.set_focus(Focus::Input);
            None
        }
        AppAction::ScrollPageUp => {
            app.ui.page_up();
            None
        }
        AppAction::ScrollPageDown => {
            app.ui.page_down();
            None
        }
        AppAction::ScrollToTop => {
            app.ui.scroll_to_top();
            None
        }
        AppAction::ScrollToBottom => {
            app.ui.scroll_to_bottom();
            None
        }
        AppAction::SetStatus { message } => {
            app.ui.set_status(message);
            None
        }
        AppAction::ClearStatus => {
            app.ui.clear_status();
            None
        }
        AppAction::Quit => {
            app.cancel_current_stream();
            app.request_exit();
            None
        }
        _ => unreachable!("non-input action routed to input handler"),
    }
}

fn paste_into_focused_field(app: &mut App, text: &str) {
    match app.ui.focus {
        Focus::Name => {
            let single_line = text.replace('\n', " ");
            let name = app.ui.apply_name_edit(|ta| {
                ta.insert_str(&single_line);
            });
            app.set_assistant_name(name);
        }
        Focus::Instruction => {
            let instruction = app.ui.apply_instruction_edit(|ta| {
                ta.insert_str(text);
            });
            app.set_system_instruction(instruction);
        }
        Focus::Model | Focus::Input => {}
    }
}
