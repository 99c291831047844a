use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Word-wraps styled lines to `max_width` columns.
///
/// Breaks happen at word boundaries; a single word wider than the whole line
/// is split between graphemes. Whitespace at a break is dropped so wrapped
/// rows never start with a space. The line style (and so a block background)
/// is carried onto every continuation row.
pub fn wrap_lines(lines: &[Line<'static>], max_width: usize) -> Vec<Line<'static>> {
    let max_width = max_width.max(1);
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        for row in wrap_spans(&line.spans, max_width) {
            out.push(Line::from(row).style(line.style));
        }
    }
    out
}

fn wrap_spans(spans: &[Span<'static>], max_width: usize) -> Vec<Vec<Span<'static>>> {
    let mut rows = Vec::new();
    let mut row = RowBuilder::default();

    for span in spans {
        for token in span.content.split_word_bounds() {
            let width = UnicodeWidthStr::width(token);
            let is_space = token.chars().all(char::is_whitespace);

            if row.width + width <= max_width {
                if !(is_space && row.width == 0 && !rows.is_empty()) {
                    row.push(token, span.style, width);
                }
                continue;
            }
            if is_space {
                rows.push(row.finish());
                continue;
            }
            if width <= max_width {
                rows.push(row.finish());
                row.push(token, span.style, width);
                continue;
            }
            for grapheme in token.graphemes(true) {
                let gw = UnicodeWidthStr::width(grapheme);
                if row.width + gw > max_width && row.width > 0 {
                    rows.push(row.finish());
                }
                row.push(grapheme, span.style, gw);
            }
        }
    }

    if !row.spans.is_empty() || rows.is_empty() {
        rows.push(row.finish());
    }
    rows
}

#[derive(Default)]
struct RowBuilder {
    spans: Vec<Span<'static>>,
    width: usize,
}

impl RowBuilder {
    fn push(&mut self, text: &str, style: Style, width: usize) {
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(text),
            _ => self.spans.push(Span::styled(text.to_string(), style)),
        }
        self.width += width;
    }

    fn finish(&mut self) -> Vec<Span<'static>> {
        if let Some(last) = self.spans.last_mut() {
            let trimmed_len = last.content.trim_end().len();
            last.content.to_mut().truncate(trimmed_len);
        }
        self.width = 0;
        std::mem::take(&mut self.spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Color, Modifier};

    fn texts(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = vec![Line::from("the quick brown fox jumps")];
        assert_eq!(
            texts(&wrap_lines(&lines, 10)),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn splits_words_longer_than_the_line() {
        let lines = vec![Line::from("abcdefghijkl")];
        assert_eq!(texts(&wrap_lines(&lines, 5)), vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn keeps_styles_across_breaks() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let lines = vec![Line::from(vec![
            Span::raw("plain "),
            Span::styled("bold words here", bold),
        ])];
        let wrapped = wrap_lines(&lines, 11);
        assert_eq!(texts(&wrapped), vec!["plain bold", "words here"]);
        assert_eq!(wrapped[1].spans[0].style, bold);
    }

    #[test]
    fn counts_wide_characters_by_columns() {
        let lines = vec![Line::from("你好世界")];
        assert_eq!(texts(&wrap_lines(&lines, 4)), vec!["你好", "世界"]);
    }

    #[test]
    fn empty_lines_survive() {
        let lines = vec![Line::from("a"), Line::default(), Line::from("b")];
        assert_eq!(texts(&wrap_lines(&lines, 10)), vec!["a", "", "b"]);
    }

    #[test]
    fn carries_line_style_to_continuations() {
        let style = Style::default().bg(Color::Blue);
        let lines = vec![Line::from("one two three").style(style)];
        let wrapped = wrap_lines(&lines, 4);
        assert!(wrapped.iter().all(|line| line.style == style));
    }
}
