use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
};

use super::{centered_fixed_rect, dialog_width};

/// Centered, bordered popup sized to its word-wrapped content.
pub struct Popup<'a> {
    lines: Vec<Line<'a>>,
    border_color: Color,
    title: Option<String>,
    padding: Padding,
    alignment: Alignment,
}

impl<'a> Popup<'a> {
    #[must_use]
    pub fn new(lines: Vec<Line<'a>>) -> Self {
        Self {
            lines,
            border_color: Color::White,
            title: None,
            padding: Padding::ZERO,
            alignment: Alignment::Left,
        }
    }

    #[must_use]
    pub fn border_color(mut self, color: Color) -> Self {
        self.border_color = color;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Borders plus left and right padding.
    fn h_chrome(&self) -> u16 {
        2 + self.padding.left + self.padding.right
    }

    /// Borders plus top and bottom padding.
    fn v_chrome(&self) -> u16 {
        2 + self.padding.top + self.padding.bottom
    }

    fn text_width(&self, terminal_width: u16) -> u16 {
        dialog_width(terminal_width)
            .saturating_sub(self.h_chrome())
            .max(1)
    }

    /// `(width, height)` of the popup on a terminal `terminal_width` columns wide.
    pub fn size(&self, terminal_width: u16) -> (u16, u16) {
        let text_width = self.text_width(terminal_width);
        let content_height: u16 = self
            .lines
            .iter()
            .map(|line| word_wrapped_line_count(line, text_width))
            .sum();
        (dialog_width(terminal_width), content_height + self.v_chrome())
    }

    /// Screen rows taken by the first `n` lines once wrapped.
    pub fn rows_before(&self, n: usize, terminal_width: u16) -> u16 {
        let text_width = self.text_width(terminal_width);
        self.lines
            .iter()
            .take(n)
            .map(|line| word_wrapped_line_count(line, text_width))
            .sum()
    }

    /// Render centered on `area` over a cleared background. Returns the
    /// content rect inside borders and padding.
    pub fn render(&self, f: &mut Frame, area: Rect) -> Rect {
        let (width, height) = self.size(area.width);
        let centered = centered_fixed_rect(width, height, area);
        f.render_widget(Clear, centered);

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border_color))
            .padding(self.padding);
        if let Some(title) = &self.title {
            block = block.title(title.as_str());
        }
        let inner = block.inner(centered);

        let paragraph = Paragraph::new(self.lines.clone())
            .block(block)
            .wrap(Wrap { trim: false })
            .alignment(self.alignment);
        f.render_widget(paragraph, centered);
        inner
    }
}

/// Estimate how many rows `line` takes when word-wrapped to `max_width`
/// columns. Byte length stands in for display width, which can only
/// overestimate.
pub fn word_wrapped_line_count(line: &Line, max_width: u16) -> u16 {
    let max_w = usize::from(max_width);
    if max_w == 0 {
        return 1;
    }
    let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();

    let mut rows: u16 = 1;
    let mut col: usize = 0;
    for word in text.split(' ') {
        let w = word.len();
        let needed = if col == 0 { w } else { w + 1 };
        if col + needed <= max_w {
            col += needed;
            continue;
        }
        if col > 0 {
            rows += 1;
        }
        col = w;
        while col > max_w {
            rows += 1;
            col -= max_w;
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::text::Span;

    #[test]
    fn test_word_wrap_counts() {
        assert_eq!(word_wrapped_line_count(&Line::raw("hello world"), 20), 1);
        assert_eq!(word_wrapped_line_count(&Line::raw("hello world"), 11), 1);
        assert_eq!(word_wrapped_line_count(&Line::raw("hello world"), 10), 2);
        assert_eq!(word_wrapped_line_count(&Line::raw("one two three four"), 5), 4);
    }

    #[test]
    fn test_word_wrap_long_words() {
        assert_eq!(word_wrapped_line_count(&Line::raw("abcdefghij"), 4), 3);
        assert_eq!(word_wrapped_line_count(&Line::raw("abcdefgh"), 4), 2);
        assert_eq!(word_wrapped_line_count(&Line::raw("hi abcdefghij"), 6), 3);
    }

    #[test]
    fn test_word_wrap_degenerate_input() {
        assert_eq!(word_wrapped_line_count(&Line::raw(""), 20), 1);
        assert_eq!(word_wrapped_line_count(&Line::raw("hello"), 0), 1);
    }

    #[test]
    fn test_word_wrap_multi_span_line() {
        let line = Line::from(vec![Span::raw("Enter "), Span::raw("IMEI")]);
        assert_eq!(word_wrapped_line_count(&line, 20), 1);
        assert_eq!(word_wrapped_line_count(&line, 7), 2);
    }

    #[test]
    fn test_popup_size() {
        let popup = Popup::new(vec![Line::raw("hello")]);
        assert_eq!(popup.size(100), (80, 3));

        let padded = Popup::new(vec![Line::raw("a"), Line::raw(""), Line::raw("b")])
            .padding(Padding::uniform(1));
        assert_eq!(padded.size(100), (80, 7));
        assert_eq!(padded.size(20).0, 16);
    }

    #[test]
    fn test_rows_before_counts_wrapped_lines() {
        let popup = Popup::new(vec![
            Line::raw("one two three four"),
            Line::raw(""),
            Line::raw("input"),
        ])
        .padding(Padding::horizontal(1));
        // 20 columns -> 16 wide popup -> 12 columns of text
        assert_eq!(popup.rows_before(1, 20), 2);
        assert_eq!(popup.rows_before(2, 20), 3);
        assert_eq!(popup.rows_before(0, 20), 0);
    }

    #[test]
    fn test_popup_builder() {
        let popup = Popup::new(vec![])
            .border_color(Color::Red)
            .title(" Confirm ")
            .alignment(Alignment::Center)
            .padding(Padding::new(1, 2, 3, 4));
        assert_eq!(popup.border_color, Color::Red);
        assert_eq!(popup.title.as_deref(), Some(" Confirm "));
        assert_eq!(popup.alignment, Alignment::Center);
        assert_eq!(popup.h_chrome(), 5);
        assert_eq!(popup.v_chrome(), 9);
    }
}
