use crate::ui::theme::Theme;
use ratatui::prelude::Size;
use ratatui::style::Style;
use std::time::Instant;
use tui_textarea::TextArea;

/// Terminals at least this wide dock the configuration panel; narrower ones
/// show it as an overlay.
pub const SIDEBAR_DOCK_MIN_WIDTH: u16 = 100;

/// Tallest the input box grows before it scrolls internally.
pub const MAX_INPUT_ROWS: u16 = 8;

/// Which widget receives typed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Name,
    Model,
    Instruction,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Name,
            Focus::Name => Focus::Model,
            Focus::Model => Focus::Instruction,
            Focus::Instruction => Focus::Input,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Input => Focus::Instruction,
            Focus::Name => Focus::Input,
            Focus::Model => Focus::Name,
            Focus::Instruction => Focus::Model,
        }
    }

    pub fn is_config_field(self) -> bool {
        !matches!(self, Focus::Input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarLayout {
    Docked,
    Overlay,
}

impl SidebarLayout {
    pub fn for_width(width: u16) -> Self {
        if width >= SIDEBAR_DOCK_MIN_WIDTH {
            SidebarLayout::Docked
        } else {
            SidebarLayout::Overlay
        }
    }
}

pub struct UiState {
    input: TextArea<'static>,
    name_field: TextArea<'static>,
    instruction_field: TextArea<'static>,
    pub focus: Focus,
    /// Overlay visibility; ignored while the panel is docked.
    pub sidebar_open: bool,
    pub theme: Theme,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    /// Rows the transcript occupied at the last draw.
    pub transcript_viewport: u16,
    /// Wrapped transcript length at the last draw.
    pub transcript_lines: u16,
    pub pulse_start: Instant,
    pub status: Option<String>,
    pub status_set_at: Option<Instant>,
    pub exit_requested: bool,
    pub last_term_size: Size,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        let mut ui = Self {
            input: TextArea::default(),
            name_field: TextArea::default(),
            instruction_field: TextArea::default(),
            focus: Focus::Input,
            sidebar_open: false,
            theme,
            scroll_offset: 0,
            auto_scroll: true,
            transcript_viewport: 0,
            transcript_lines: 0,
            pulse_start: Instant::now(),
            status: None,
            status_set_at: None,
            exit_requested: false,
            last_term_size: Size::default(),
        };
        ui.configure_textareas();
        ui
    }

    fn configure_textareas(&mut self) {
        let text_style = self
            .theme
            .input_text_style
            .patch(Style::default().bg(self.theme.background_color));
        for textarea in [
            &mut self.input,
            &mut self.name_field,
            &mut self.instruction_field,
        ] {
            textarea.set_style(text_style);
            textarea.set_cursor_line_style(self.theme.input_cursor_line_style);
            textarea.set_placeholder_style(self.theme.placeholder_style);
        }
        self.apply_focus_styles();
    }

    /// Only the focused editor shows a cursor.
    fn apply_focus_styles(&mut self) {
        let focused = self.theme.input_cursor_style;
        let hidden = Style::default();
        let pick = |field: Focus, focus: Focus| if field == focus { focused } else { hidden };
        self.input.set_cursor_style(pick(Focus::Input, self.focus));
        self.name_field.set_cursor_style(pick(Focus::Name, self.focus));
        self.instruction_field
            .set_cursor_style(pick(Focus::Instruction, self.focus));
    }

    pub fn layout(&self) -> SidebarLayout {
        SidebarLayout::for_width(self.last_term_size.width)
    }

    pub fn is_sidebar_visible(&self) -> bool {
        match self.layout() {
            SidebarLayout::Docked => true,
            SidebarLayout::Overlay => self.sidebar_open,
        }
    }

    /// Moves focus, opening the overlay when a configuration field gains it.
    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        if self.layout() == SidebarLayout::Overlay {
            self.sidebar_open = focus.is_config_field();
        }
        self.apply_focus_styles();
    }

    pub fn set_input_placeholder(&mut self, assistant_name: &str) {
        self.input
            .set_placeholder_text(format!("Message {assistant_name}..."));
    }

    pub fn input_textarea(&self) -> &TextArea<'static> {
        &self.input
    }

    pub fn name_textarea(&self) -> &TextArea<'static> {
        &self.name_field
    }

    pub fn instruction_textarea(&self) -> &TextArea<'static> {
        &self.instruction_field
    }

    pub fn get_input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    pub fn set_input_text(&mut self, text: &str) {
        let placeholder = self.input.placeholder_text().to_string();
        self.input = textarea_with(text);
        self.configure_input_after_reset(placeholder);
    }

    pub fn clear_input(&mut self) {
        self.set_input_text("");
    }

    fn configure_input_after_reset(&mut self, placeholder: String) {
        let text_style = self
            .theme
            .input_text_style
            .patch(Style::default().bg(self.theme.background_color));
        self.input.set_style(text_style);
        self.input
            .set_cursor_line_style(self.theme.input_cursor_line_style);
        self.input.set_placeholder_style(self.theme.placeholder_style);
        self.input.set_placeholder_text(placeholder);
        self.apply_focus_styles();
    }

    pub fn apply_input_edit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.input);
    }

    pub fn apply_name_edit<F>(&mut self, f: F) -> String
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.name_field);
        self.name_field.lines().join("")
    }

    pub fn apply_instruction_edit<F>(&mut self, f: F) -> String
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.instruction_field);
        self.instruction_field.lines().join("\n")
    }

    /// Loads the configuration values into the panel's editors.
    pub fn load_config_fields(&mut self, name: &str, instruction: &str) {
        self.name_field = textarea_with(name);
        self.instruction_field = textarea_with(instruction);
        self.configure_textareas();
    }

    /// Rows the input box needs, between one and [`MAX_INPUT_ROWS`]. The
    /// textarea scrolls long lines sideways, so only hard lines count.
    pub fn input_height(&self) -> u16 {
        let rows = self.input.lines().len().min(usize::from(MAX_INPUT_ROWS));
        (rows as u16).max(1)
    }

    pub fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = Some(status.into());
        self.status_set_at = Some(Instant::now());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_set_at = None;
    }

    /// Re-enables follow mode; the next draw pins the view to the bottom.
    pub fn follow_log(&mut self) {
        self.auto_scroll = true;
    }

    fn max_scroll_offset(&self) -> u16 {
        self.transcript_lines
            .saturating_sub(self.transcript_viewport)
    }

    /// Scroll to the very top of the transcript and disable auto-scroll.
    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll_offset();
        self.auto_scroll = true;
    }

    /// Page up by one viewport (minus one line overlap). Disables auto-scroll.
    pub fn page_up(&mut self) {
        self.auto_scroll = false;
        let step = self.transcript_viewport.saturating_sub(1).max(1);
        self.scroll_offset = self.scroll_offset.saturating_sub(step);
    }

    /// Page down by one viewport; reaching the bottom resumes following.
    pub fn page_down(&mut self) {
        let step = self.transcript_viewport.saturating_sub(1).max(1);
        let max_scroll = self.max_scroll_offset();
        self.scroll_offset = self.scroll_offset.saturating_add(step).min(max_scroll);
        self.auto_scroll = self.scroll_offset >= max_scroll;
    }

    /// Records the transcript geometry of a draw and returns the offset to
    /// render with.
    pub fn settle_scroll(&mut self, total_lines: u16, viewport: u16) -> u16 {
        self.transcript_lines = total_lines;
        self.transcript_viewport = viewport;
        let max_scroll = self.max_scroll_offset();
        if self.auto_scroll {
            self.scroll_offset = max_scroll;
        } else {
            self.scroll_offset = self.scroll_offset.min(max_scroll);
        }
        self.scroll_offset
    }
}

fn textarea_with(text: &str) -> TextArea<'static> {
    let lines: Vec<String> = if text.is_empty() {
        vec![String::new()]
    } else {
        text.split('\n').map(str::to_string).collect()
    };
    let mut textarea = TextArea::from(lines);
    textarea.move_cursor(tui_textarea::CursorMove::Bottom);
    textarea.move_cursor(tui_textarea::CursorMove::End);
    textarea
}
