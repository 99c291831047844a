use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub timestamp_style: Style,
    pub error_text_style: Style,

    // Markdown
    pub md_heading_style: Style,
    pub md_code_style: Style,
    pub md_quote_style: Style,
    pub md_list_marker_style: Style,

    // Chrome
    pub title_style: Style,
    pub online_style: Style,
    pub streaming_indicator_style: Style,
    pub footer_style: Style,
    pub status_style: Style,
    pub panel_border_style: Style,
    pub focused_border_style: Style,
    pub label_style: Style,

    // Input area
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,
    pub input_cursor_style: Style,
    pub input_cursor_line_style: Style,
    pub placeholder_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            background_color: Color::Rgb(0x0f, 0x11, 0x17),
            user_prefix_style: Style::default()
                .fg(Color::Rgb(0x7d, 0xcf, 0xff))
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Rgb(0xc0, 0xe8, 0xff)),
            assistant_prefix_style: Style::default()
                .fg(Color::Rgb(0xbb, 0x9a, 0xf7))
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::Rgb(0xe6, 0xe6, 0xe6)),
            timestamp_style: Style::default().fg(Color::DarkGray),
            error_text_style: Style::default().fg(Color::Rgb(0xf7, 0x76, 0x8e)),

            md_heading_style: Style::default()
                .fg(Color::Rgb(0xe0, 0xaf, 0x68))
                .add_modifier(Modifier::BOLD),
            md_code_style: Style::default()
                .fg(Color::Rgb(0x9e, 0xce, 0x6a))
                .bg(Color::Rgb(0x1a, 0x1b, 0x26)),
            md_quote_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            md_list_marker_style: Style::default().fg(Color::Rgb(0x7a, 0xa2, 0xf7)),

            title_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            online_style: Style::default().fg(Color::Green),
            streaming_indicator_style: Style::default().fg(Color::Rgb(0xbb, 0x9a, 0xf7)),
            footer_style: Style::default().fg(Color::DarkGray),
            status_style: Style::default().fg(Color::Yellow),
            panel_border_style: Style::default().fg(Color::DarkGray),
            focused_border_style: Style::default().fg(Color::Rgb(0x7a, 0xa2, 0xf7)),
            label_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),

            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),
            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            input_cursor_line_style: Style::default(),
            placeholder_style: Style::default().fg(Color::DarkGray),
        }
    }

    /// Attribute-only palette for `NO_COLOR` terminals.
    pub fn monochrome() -> Self {
        let plain = Style::default();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        Theme {
            background_color: Color::Reset,
            user_prefix_style: bold,
            user_text_style: plain,
            assistant_prefix_style: bold,
            assistant_text_style: plain,
            timestamp_style: Style::default().add_modifier(Modifier::DIM),
            error_text_style: bold,
            md_heading_style: bold.add_modifier(Modifier::UNDERLINED),
            md_code_style: Style::default().add_modifier(Modifier::REVERSED),
            md_quote_style: Style::default().add_modifier(Modifier::ITALIC),
            md_list_marker_style: plain,
            title_style: bold,
            online_style: plain,
            streaming_indicator_style: plain,
            footer_style: Style::default().add_modifier(Modifier::DIM),
            status_style: bold,
            panel_border_style: plain,
            focused_border_style: bold,
            label_style: bold,
            input_border_style: plain,
            input_title_style: plain,
            input_text_style: plain,
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            input_cursor_line_style: plain,
            placeholder_style: Style::default().add_modifier(Modifier::DIM),
        }
    }

    /// Honors the `NO_COLOR` convention.
    pub fn detect() -> Self {
        if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            Self::monochrome()
        } else {
            Self::dark_default()
        }
    }
}
