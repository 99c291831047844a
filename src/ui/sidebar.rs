//! Configuration panel: name, model and system instruction editors plus the
//! restart control.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::core::app::{App, Focus};
use crate::core::config::find_model;

/// Width of the panel when docked; the overlay uses up to the same width.
pub const SIDEBAR_WIDTH: u16 = 36;

pub fn render_sidebar(f: &mut Frame, app: &App, area: Rect, overlay: bool) {
    let theme = &app.ui.theme;
    if overlay {
        f.render_widget(Clear, area);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.panel_border_style)
        .style(Style::default().bg(theme.background_color))
        .title(Span::styled(" Assistant settings ", theme.title_style));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let field_block = |title: &'static str, focus: Focus| {
        let border = if app.ui.focus == focus {
            theme.focused_border_style
        } else {
            theme.panel_border_style
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Span::styled(title, theme.label_style))
    };

    let name_block = field_block(" Name ", Focus::Name);
    let name_inner = name_block.inner(chunks[0]);
    f.render_widget(name_block, chunks[0]);
    f.render_widget(app.ui.name_textarea(), name_inner);

    let model_block = field_block(" Model ", Focus::Model);
    let model_inner = model_block.inner(chunks[1]);
    f.render_widget(model_block, chunks[1]);
    f.render_widget(Paragraph::new(model_line(app)), model_inner);

    let instruction_block = field_block(" System instruction ", Focus::Instruction);
    let instruction_inner = instruction_block.inner(chunks[2]);
    f.render_widget(instruction_block, chunks[2]);
    f.render_widget(app.ui.instruction_textarea(), instruction_inner);

    let restart = Line::from(vec![
        Span::styled(
            " Ctrl+R ",
            theme.focused_border_style.add_modifier(Modifier::REVERSED),
        ),
        Span::styled(" Apply & restart chat", theme.label_style),
    ]);
    f.render_widget(Paragraph::new(restart), chunks[3]);

    let hint = if overlay {
        "Tab next field · Esc close"
    } else {
        "Tab next field · Esc back to chat"
    };
    f.render_widget(
        Paragraph::new(Span::styled(hint, theme.footer_style)),
        chunks[4],
    );
}

fn model_line(app: &App) -> Line<'static> {
    let theme = &app.ui.theme;
    let model = &app.config.get().model;
    let label = find_model(model)
        .map(|option| option.label.to_string())
        .unwrap_or_else(|| model.clone());
    let arrows = if app.ui.focus == Focus::Model {
        theme.focused_border_style
    } else {
        theme.footer_style
    };
    Line::from(vec![
        Span::styled("‹ ", arrows),
        Span::styled(label, theme.assistant_text_style),
        Span::styled(" ›", arrows),
    ])
}

/// Region the overlay panel covers within `area`.
pub fn overlay_area(area: Rect) -> Rect {
    let width = area.width.min(SIDEBAR_WIDTH + 4);
    Rect {
        x: area.x,
        y: area.y,
        width,
        height: area.height,
    }
}
