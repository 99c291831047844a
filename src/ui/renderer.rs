use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::app::{App, SidebarLayout};
use crate::core::message::Message;
use crate::ui::markdown::render_markdown;
use crate::ui::sidebar::{overlay_area, render_sidebar, SIDEBAR_WIDTH};
use crate::ui::theme::Theme;
use crate::ui::wrap::wrap_lines;

pub const EMPTY_STATE_TEXT: &str = "Configure your assistant and start chatting!";
pub const FOOTER_TEXT: &str = "Gemini can make mistakes. Please check important information.";

pub fn ui(f: &mut Frame, app: &mut App) {
    let area = f.area();
    app.ui.last_term_size = area.as_size();

    f.render_widget(
        Block::default().style(Style::default().bg(app.ui.theme.background_color)),
        area,
    );

    let layout = app.ui.layout();
    let main_area = if layout == SidebarLayout::Docked {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);
        render_sidebar(f, app, columns[0], false);
        columns[1]
    } else {
        area
    };

    render_chat(f, app, main_area);

    if layout == SidebarLayout::Overlay && app.ui.sidebar_open {
        render_sidebar(f, app, overlay_area(area), true);
    }
}

fn render_chat(f: &mut Frame, app: &mut App, area: Rect) {
    let input_height = app.ui.input_height();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(input_height + 2),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_transcript(f, app, chunks[1]);
    render_input(f, app, chunks[2]);

    f.render_widget(
        Paragraph::new(Span::styled(FOOTER_TEXT, app.ui.theme.footer_style))
            .alignment(Alignment::Center),
        chunks[3],
    );
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let config = app.config.get();
    let mut spans = vec![
        Span::styled(format!(" {}", config.name), theme.title_style),
        Span::styled("  ● Online", theme.online_style),
        Span::styled(format!("  {}", config.short_model()), theme.timestamp_style),
    ];
    if let Some(status) = &app.ui.status {
        spans.push(Span::styled(format!("  · {status}"), theme.status_style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_transcript(f: &mut Frame, app: &mut App, area: Rect) {
    let content_width = usize::from(area.width.saturating_sub(2).max(1));
    let logical = build_transcript_lines(app);
    let lines = if logical.is_empty() {
        Vec::new()
    } else {
        wrap_lines(&logical, content_width)
    };

    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let offset = app.ui.settle_scroll(total, area.height);

    let inner = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };

    if lines.is_empty() {
        let middle = Rect {
            y: area.y + area.height / 2,
            height: 1.min(area.height),
            ..inner
        };
        f.render_widget(
            Paragraph::new(Span::styled(EMPTY_STATE_TEXT, app.ui.theme.timestamp_style))
                .alignment(Alignment::Center),
            middle,
        );
        return;
    }

    f.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);
}

/// Logical transcript lines: one header per message, its content, and a
/// blank separator.
pub fn build_transcript_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.ui.theme;
    let mut lines = Vec::new();
    for message in app.log.messages() {
        lines.push(message_header(message, app.assistant_name(), theme));
        if message.is_loading {
            lines.push(loading_line(app, theme));
        } else if message.is_error {
            lines.push(Line::from(Span::styled(
                message.content.clone(),
                theme.error_text_style,
            )));
        } else {
            let base = if message.is_user() {
                theme.user_text_style
            } else {
                theme.assistant_text_style
            };
            lines.extend(render_markdown(&message.content, theme, base));
        }
        lines.push(Line::default());
    }
    lines
}

fn message_header(message: &Message, assistant_name: &str, theme: &Theme) -> Line<'static> {
    let (author, style) = if message.is_user() {
        ("You".to_string(), theme.user_prefix_style)
    } else {
        (assistant_name.to_string(), theme.assistant_prefix_style)
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    Line::from(vec![
        Span::styled(author, style),
        Span::styled(format!("  {time}"), theme.timestamp_style),
    ])
}

fn loading_line(app: &App, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            pulse_symbol(app.ui.pulse_start.elapsed().as_millis()),
            theme.streaming_indicator_style,
        ),
        Span::styled(
            " thinking…",
            theme.timestamp_style.add_modifier(Modifier::ITALIC),
        ),
    ])
}

/// Two pulses per second, ramping through three glyphs.
fn pulse_symbol(elapsed_ms: u128) -> &'static str {
    let phase = (elapsed_ms % 1000) as f32 / 500.0;
    let intensity = if phase < 1.0 { phase } else { 2.0 - phase };
    if intensity < 0.33 {
        "○"
    } else if intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let border = if app.ui.focus == crate::core::app::Focus::Input {
        theme.focused_border_style
    } else {
        theme.input_border_style
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(
            " Enter send · Shift+Enter newline · Ctrl+O settings · Ctrl+Y copy ",
            theme.input_title_style,
        ));
    if app.exchange.is_sending() {
        block = block.title_top(
            Line::from(Span::styled(
                format!(" {} ", pulse_symbol(app.ui.pulse_start.elapsed().as_millis())),
                theme.streaming_indicator_style,
            ))
            .right_aligned(),
        );
    }

    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(app.ui.input_textarea(), inner);
}
