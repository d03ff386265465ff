use crate::theme::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};
use semiauto_core::test_list::{TestListView, TestRow};

/// Diagnostic lines shown under a description before truncating.
const MAX_MESSAGE_LINES: usize = 4;

/// Cursor and scroll state for the table. The cursor follows the running
/// test until the operator moves it.
#[derive(Debug)]
pub struct TableView {
    pub selected: Option<usize>,
    pub follow: bool,
    page_rows: usize,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new()
    }
}

impl TableView {
    pub fn new() -> Self {
        Self {
            selected: None,
            follow: true,
            page_rows: 1,
        }
    }

    /// Snap the cursor to the running test while following.
    pub fn sync(&mut self, tests: &TestListView) {
        if tests.is_empty() {
            self.selected = None;
            return;
        }
        if self.follow
            && let Some(focused) = tests.focused()
        {
            self.selected = Some(focused);
        }
        if let Some(selected) = self.selected {
            self.selected = Some(selected.min(tests.len() - 1));
        }
    }

    pub fn page_rows(&self) -> usize {
        self.page_rows
    }

    pub fn set_page_rows(&mut self, rows: usize) {
        self.page_rows = rows.max(1);
    }

    pub fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        self.follow = false;
        let current = self.selected.unwrap_or(0);
        let target = current.saturating_add_signed(delta).min(len - 1);
        self.selected = Some(target);
    }

    pub fn move_page(&mut self, pages: isize, len: usize) {
        let step = isize::try_from(self.page_rows).unwrap_or(isize::MAX);
        self.move_by(pages.saturating_mul(step), len);
    }

    pub fn move_to_top(&mut self, len: usize) {
        if len > 0 {
            self.follow = false;
            self.selected = Some(0);
        }
    }

    /// Jump to the last row and resume following the running test.
    pub fn move_to_bottom(&mut self, len: usize) {
        if len > 0 {
            self.follow = true;
            self.selected = Some(len - 1);
        }
    }
}

fn message_lines<'a>(message: &'a str, theme: &Theme) -> Vec<Line<'a>> {
    let style = Style::default().fg(theme.muted);
    let all: Vec<&str> = message.lines().collect();
    let mut lines: Vec<Line> = all
        .iter()
        .take(MAX_MESSAGE_LINES)
        .map(|l| Line::styled(format!("  {l}"), style))
        .collect();
    if all.len() > MAX_MESSAGE_LINES {
        lines.push(Line::styled(
            format!("  … {} more lines", all.len() - MAX_MESSAGE_LINES),
            style,
        ));
    }
    lines
}

fn table_row<'a>(row: &'a TestRow, theme: &Theme) -> Row<'a> {
    let mut description = vec![Line::raw(row.descriptor.description.as_str())];
    if let Some(message) = &row.message {
        description.extend(message_lines(message, theme));
    }
    let height = u16::try_from(description.len()).unwrap_or(u16::MAX);

    let result = row.result.as_deref().unwrap_or(row.outcome.label());
    Row::new(vec![
        Cell::from(Text::from(description)),
        Cell::from(result).style(theme.outcome_style(row.outcome)),
    ])
    .height(height)
}

pub fn draw(f: &mut Frame, area: Rect, tests: &TestListView, view: &mut TableView, theme: &Theme) {
    let summary = tests.summary();
    let title = if tests.is_empty() {
        " Waiting for test list ".to_string()
    } else {
        format!(" {} tests ", summary.total)
    };

    let rows: Vec<Row> = tests.rows().iter().map(|r| table_row(r, theme)).collect();
    let header = Row::new(vec!["Test", "Result"]).style(
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(rows, [Constraint::Fill(3), Constraint::Fill(1)])
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(theme.border)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▸ ");

    // Borders and the header row
    view.set_page_rows(usize::from(area.height.saturating_sub(3)));

    let mut state = TableState::default().with_selected(view.selected);
    f.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::buffer_text;
    use ratatui::{Terminal, backend::TestBackend};
    use semiauto_core::config::ThemeConfig;
    use semiauto_core::protocol::{TestEvent, TestEventKind};
    use semiauto_core::test_list::{TestDescriptor, TestId};

    fn view_with(names: &[&str]) -> TestListView {
        let mut tests = TestListView::new();
        tests.reset_table(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| TestDescriptor {
                    id: TestId::from(i.to_string()),
                    description: (*name).to_string(),
                })
                .collect(),
        );
        tests
    }

    fn update(tests: &mut TestListView, id: &str, kind: TestEventKind, detail: Option<&str>) {
        tests
            .update_test(&TestEvent {
                id: TestId::from(id),
                kind,
                detail: detail.map(str::to_string),
                message: None,
            })
            .unwrap();
    }

    fn render(tests: &TestListView, view: &mut TableView, width: u16, height: u16) -> String {
        let theme = Theme::from_config(&ThemeConfig::default());
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| draw(f, f.area(), tests, view, &theme))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_renders_rows_and_results() {
        let mut tests = view_with(&["Geolocation works", "Vibration works"]);
        update(&mut tests, "0", TestEventKind::Failure, Some("timeout"));
        update(&mut tests, "1", TestEventKind::Success, None);

        let output = render(&tests, &mut TableView::new(), 80, 10);
        assert!(output.contains("2 tests"));
        assert!(output.contains("Geolocation works"));
        assert!(output.contains("timeout"));
        assert!(output.contains("Vibration works"));
        assert!(output.contains("Pass"));
    }

    #[test]
    fn test_started_test_has_empty_result_cell() {
        let mut tests = view_with(&["Vibration works"]);
        update(&mut tests, "0", TestEventKind::TestStart, None);

        let output = render(&tests, &mut TableView::new(), 60, 6);
        let row = output
            .lines()
            .find(|l| l.contains("Vibration works"))
            .unwrap();
        let result = row.split("Vibration works").nth(1).unwrap();
        assert_eq!(result.trim_matches(|c: char| c == ' ' || c == '│'), "");
        assert!(!output.contains("Running"));
    }

    #[test]
    fn test_empty_table_waits_for_manifest() {
        let output = render(&TestListView::new(), &mut TableView::new(), 60, 6);
        assert!(output.contains("Waiting for test list"));
    }

    #[test]
    fn test_message_shown_under_description() {
        let mut tests = view_with(&["Camera works"]);
        tests
            .update_test(&TestEvent {
                id: TestId::from("0"),
                kind: TestEventKind::Failure,
                detail: Some("Fail".to_string()),
                message: Some("assert failed\nat line 3".to_string()),
            })
            .unwrap();
        let output = render(&tests, &mut TableView::new(), 80, 10);
        let lines: Vec<&str> = output.lines().collect();
        let desc = lines.iter().position(|l| l.contains("Camera works")).unwrap();
        assert!(lines[desc + 1].contains("assert failed"));
        assert!(lines[desc + 2].contains("at line 3"));
    }

    #[test]
    fn test_long_message_is_truncated() {
        let lines: Vec<String> = (0..10).map(|i| format!("line {i}")).collect();
        let theme = Theme::from_config(&ThemeConfig::default());
        let joined = lines.join("\n");
        let rendered = message_lines(&joined, &theme);
        assert_eq!(rendered.len(), MAX_MESSAGE_LINES + 1);
        assert_eq!(rendered[MAX_MESSAGE_LINES].to_string(), "  … 6 more lines");
    }

    #[test]
    fn test_view_follows_running_test() {
        let mut tests = view_with(&["a", "b", "c"]);
        let mut view = TableView::new();
        update(&mut tests, "2", TestEventKind::TestStart, None);
        view.sync(&tests);
        assert_eq!(view.selected, Some(2));

        view.move_by(-1, tests.len());
        assert!(!view.follow);
        update(&mut tests, "0", TestEventKind::TestStart, None);
        view.sync(&tests);
        assert_eq!(view.selected, Some(1));

        view.move_to_bottom(tests.len());
        assert!(view.follow);
        view.sync(&tests);
        assert_eq!(view.selected, Some(0));
    }

    #[test]
    fn test_view_movement_clamps() {
        let mut view = TableView::new();
        view.set_page_rows(10);
        view.move_page(1, 4);
        assert_eq!(view.selected, Some(3));
        view.move_page(-1, 4);
        assert_eq!(view.selected, Some(0));
        view.move_by(-5, 4);
        assert_eq!(view.selected, Some(0));
        view.move_by(1, 0);
        assert_eq!(view.selected, Some(0));
    }

    #[test]
    fn test_page_rows_track_area() {
        let tests = view_with(&["a"]);
        let mut view = TableView::new();
        render(&tests, &mut view, 40, 12);
        assert_eq!(view.page_rows(), 9);
    }
}
