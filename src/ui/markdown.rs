//! Markdown to styled terminal lines.
//!
//! Produces logical (unwrapped) lines; the renderer wraps them to the
//! transcript width afterwards. Supported: paragraphs, headings, emphasis,
//! strong, strikethrough, inline and fenced code, nested lists, task
//! markers, block quotes, links and rules. Tables degrade to their cell
//! text separated by `│`.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::ui::theme::Theme;

const QUOTE_PREFIX: &str = "│ ";
const RULE_WIDTH: usize = 24;

pub fn render_markdown(content: &str, theme: &Theme, base: Style) -> Vec<Line<'static>> {
    MarkdownRenderer::new(theme, base).render(content)
}

#[derive(Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

struct MarkdownRenderer<'t> {
    theme: &'t Theme,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    pending_marker: Option<String>,
    quote_depth: usize,
    code_block: Option<String>,
    link: Option<(String, String)>,
}

impl<'t> MarkdownRenderer<'t> {
    fn new(theme: &'t Theme, base: Style) -> Self {
        Self {
            theme,
            lines: Vec::new(),
            current: Vec::new(),
            style_stack: vec![base],
            list_stack: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            code_block: None,
            link: None,
        }
    }

    fn style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let next = self.style().patch(patch);
        self.style_stack.push(next);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn line_prefix(&mut self) -> Vec<Span<'static>> {
        let mut prefix = Vec::new();
        if self.quote_depth > 0 {
            prefix.push(Span::styled(
                QUOTE_PREFIX.repeat(self.quote_depth),
                self.theme.md_quote_style,
            ));
        }
        let depth = self.list_stack.len();
        if depth > 0 {
            let indent = "  ".repeat(depth - 1);
            match self.pending_marker.take() {
                Some(marker) => {
                    prefix.push(Span::raw(indent));
                    prefix.push(Span::styled(marker, self.theme.md_list_marker_style));
                }
                None => prefix.push(Span::raw(format!("{indent}  "))),
            }
        }
        prefix
    }

    fn push_text(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        if self.current.is_empty() {
            self.current = self.line_prefix();
        }
        if let Some((_, shown)) = self.link.as_mut() {
            shown.push_str(text);
        }
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank_line(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    /// Blocks directly inside a list item stay tight.
    fn end_block(&mut self) {
        if self.list_stack.is_empty() {
            self.blank_line();
        } else {
            self.flush_line();
        }
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_TABLES);

        for event in Parser::new_ext(content, options) {
            match event {
                Event::Start(tag) => self.start(tag),
                Event::End(tag) => self.end(tag),
                Event::Text(text) => {
                    if let Some(buffer) = self.code_block.as_mut() {
                        buffer.push_str(&text);
                    } else {
                        let style = self.style();
                        self.push_text(&text, style);
                    }
                }
                Event::Code(code) => {
                    let style = self.style().patch(self.theme.md_code_style);
                    self.push_text(&code, style);
                }
                Event::SoftBreak => {
                    let style = self.style();
                    self.push_text(" ", style);
                }
                Event::HardBreak => self.flush_line(),
                Event::Rule => {
                    self.flush_line();
                    let rule = "─".repeat(RULE_WIDTH);
                    self.push_text(&rule, self.theme.timestamp_style);
                    self.blank_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.push_text(marker, self.theme.md_list_marker_style);
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let style = self.style();
                    self.push_text(html.trim_end_matches('\n'), style);
                }
                _ => {}
            }
        }

        self.flush_line();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { .. } => {
                self.flush_line();
                self.push_style(self.theme.md_heading_style);
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
                self.push_style(self.theme.md_quote_style);
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        let label = format!("[{lang}]");
                        self.push_text(&label, self.theme.timestamp_style);
                        self.flush_line();
                    }
                }
                self.code_block = Some(String::new());
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some((dest_url.to_string(), String::new()));
                self.push_style(Style::default().add_modifier(Modifier::UNDERLINED));
            }
            Tag::TableCell => {
                if !self.current.is_empty() {
                    self.push_text(" │ ", self.theme.panel_border_style);
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading(_) => {
                self.pop_style();
                self.end_block();
            }
            TagEnd::BlockQuote(_) => {
                self.pop_style();
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    self.end_block();
                }
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                self.flush_line();
                self.pending_marker = None;
            }
            TagEnd::CodeBlock => {
                let code = self.code_block.take().unwrap_or_default();
                let style = self.theme.md_code_style;
                for line in code.trim_end_matches('\n').split('\n') {
                    self.push_text(" ", style);
                    self.push_text(line, style);
                    self.push_text(" ", style);
                    self.flush_line();
                }
                self.end_block();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some((url, shown)) = self.link.take() {
                    if !url.is_empty() && url != shown {
                        self.push_text(&format!(" ({url})"), self.theme.timestamp_style);
                    }
                }
            }
            TagEnd::TableHead | TagEnd::TableRow => self.flush_line(),
            TagEnd::Table => self.end_block(),
            _ => {}
        }
    }
}
