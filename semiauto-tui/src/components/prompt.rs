use super::popup::Popup;
use crate::theme::Theme;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Padding,
};
use semiauto_core::{
    config::{
        KeysConfig,
        keys::{Command, KeyContext},
    },
    dialog::{CANCEL_KEY, Dialog, DialogFocus, DialogKind, OK_KEY},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Portion of the prompt text that fits the field, and where the cursor lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct InputWindow {
    start: usize,
    end: usize,
    cursor_col: u16,
}

/// Scroll the field horizontally so the cursor (a byte offset on a grapheme
/// boundary) stays visible within `width` columns.
fn input_window(text: &str, cursor: usize, width: u16) -> InputWindow {
    let width = usize::from(width);
    if width == 0 {
        return InputWindow {
            start: 0,
            end: 0,
            cursor_col: 0,
        };
    }

    // (byte offset, starting column) of each grapheme, plus the end of text
    let mut stops: Vec<(usize, usize)> = Vec::new();
    let mut col = 0;
    for (offset, grapheme) in text.grapheme_indices(true) {
        stops.push((offset, col));
        col += grapheme.width();
    }
    stops.push((text.len(), col));

    let cursor_stop = stops
        .iter()
        .rposition(|(offset, _)| *offset <= cursor)
        .unwrap_or(0);
    let cursor_abs = stops[cursor_stop].1;
    let first_visible_col = cursor_abs.saturating_sub(width - 1);
    let start_stop = stops
        .iter()
        .position(|(_, c)| *c >= first_visible_col)
        .unwrap_or(0);
    let start_col = stops[start_stop].1;

    let end_stop = stops
        .iter()
        .rposition(|(_, c)| *c >= start_col && *c - start_col <= width)
        .unwrap_or(start_stop);

    InputWindow {
        start: stops[start_stop].0,
        end: stops[end_stop].0,
        cursor_col: u16::try_from(cursor_abs - start_col).unwrap_or(u16::MAX),
    }
}

fn key_label(keys: &KeysConfig, context: KeyContext, command: &Command, fallback: &str) -> String {
    KeysConfig::find_key(&keys.keymap_for_context(context), command)
        .map_or_else(|| fallback.to_string(), |k| k.to_string())
}

fn button<'a>(label: &'a str, focused: bool, theme: &Theme) -> Span<'a> {
    let style = if focused {
        Style::default()
            .bg(theme.accent)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.accent)
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn title(kind: DialogKind) -> &'static str {
    match kind {
        DialogKind::Prompt => " Input required ",
        DialogKind::Instruct => " Instruction ",
        DialogKind::Confirm => " Confirm ",
    }
}

fn hint_line<'a>(dialog: &Dialog, keys: &KeysConfig, theme: &Theme) -> Line<'a> {
    let key_style = Style::default().fg(theme.hint).add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    if dialog.input_has_focus() {
        let context = KeyContext::DialogInput;
        spans.push(Span::styled(
            key_label(keys, context, &Command::Confirm, "enter"),
            key_style,
        ));
        spans.push(Span::raw(": submit  "));
        spans.push(Span::styled(
            key_label(keys, context, &Command::FocusNext, "tab"),
            key_style,
        ));
        spans.push(Span::raw(": buttons"));
    } else {
        spans.push(Span::styled(OK_KEY.to_string(), key_style));
        spans.push(Span::raw(format!(": {}  ", dialog.ok_label())));
        spans.push(Span::styled(CANCEL_KEY.to_string(), key_style));
        spans.push(Span::raw(format!(": {}", dialog.cancel_label())));
    }
    Line::from(spans)
}

/// Draw the open dialog over `area`, placing the terminal cursor in the
/// text field while it has focus.
pub fn draw(f: &mut Frame, area: Rect, dialog: &Dialog, keys: &KeysConfig, theme: &Theme) {
    let mut lines: Vec<Line> = dialog.message().lines().map(Line::raw).collect();
    if lines.is_empty() {
        lines.push(Line::raw(""));
    }
    lines.push(Line::raw(""));

    // The field line is filled in once the popup width is known.
    let input_row = dialog.kind().has_input().then(|| {
        lines.push(Line::raw(""));
        lines.push(Line::raw(""));
        lines.len() - 2
    });

    lines.push(Line::from(vec![
        button(dialog.ok_label(), dialog.focus() == DialogFocus::Ok, theme),
        Span::raw("   "),
        button(
            dialog.cancel_label(),
            dialog.focus() == DialogFocus::Cancel,
            theme,
        ),
    ]));
    lines.push(Line::raw(""));
    lines.push(hint_line(dialog, keys, theme));

    let padding = Padding::horizontal(2);
    let text_width = super::dialog_width(area.width).saturating_sub(2 + 4);
    let field_width = text_width.saturating_sub(2);
    let mut cursor = None;
    if let Some(row) = input_row {
        let input = dialog.input();
        let window = input_window(input.text(), input.cursor(), field_width);
        let field_style = if dialog.input_has_focus() {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.muted)
        };
        lines[row] = Line::from(vec![
            Span::styled("> ", field_style),
            Span::raw(input.text()[window.start..window.end].to_string()),
        ]);
        cursor = Some((row, window.cursor_col));
    }

    let popup = Popup::new(lines)
        .border_color(theme.accent)
        .title(title(dialog.kind()))
        .padding(padding)
        .alignment(Alignment::Left);
    let inner = popup.render(f, area);

    if let Some((row, col)) = cursor
        && dialog.input_has_focus()
    {
        let y = inner.y + popup.rows_before(row, area.width);
        let x = inner.x + 2 + col;
        if y < inner.bottom() && x < inner.right() {
            f.set_cursor_position((x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::buffer_text;
    use ratatui::{Terminal, backend::TestBackend};
    use semiauto_core::config::ThemeConfig;
    use semiauto_core::dialog::TextEdit;
    use semiauto_core::keys::KeyDispatcher;

    fn shown(message: &str, kind: DialogKind) -> Dialog {
        let mut keys = KeyDispatcher::new();
        let mut dialog = Dialog::new(message, kind);
        dialog.show(&mut keys);
        dialog
    }

    fn render(dialog: &Dialog, width: u16, height: u16) -> (String, Terminal<TestBackend>) {
        let theme = Theme::from_config(&ThemeConfig::default());
        let keys = KeysConfig::default();
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|f| draw(f, f.area(), dialog, &keys, &theme))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        (text, terminal)
    }

    #[test]
    fn test_input_window_no_scroll() {
        let window = input_window("hello", 2, 10);
        assert_eq!((window.start, window.end, window.cursor_col), (0, 5, 2));
    }

    #[test]
    fn test_input_window_scrolls_to_cursor() {
        let text = "hello world";
        let window = input_window(text, text.len(), 5);
        assert_eq!(&text[window.start..window.end], "orld");
        assert_eq!(window.cursor_col, 4);
    }

    #[test]
    fn test_input_window_wide_graphemes() {
        let text = "A👩‍💻B";
        let window = input_window(text, "A👩‍💻".len(), 3);
        assert_eq!(&text[window.start..window.end], "👩‍💻B");
        assert_eq!(window.cursor_col, 2);
    }

    #[test]
    fn test_input_window_empty() {
        let window = input_window("", 0, 10);
        assert_eq!((window.start, window.end, window.cursor_col), (0, 0, 0));
    }

    #[test]
    fn test_confirm_dialog_renders_yes_no() {
        let dialog = shown("Did the phone ring?", DialogKind::Confirm);
        let (text, _) = render(&dialog, 100, 20);
        assert!(text.contains("Confirm"));
        assert!(text.contains("Did the phone ring?"));
        assert!(text.contains("[ Yes ]"));
        assert!(text.contains("[ No ]"));
        assert!(text.contains("y: Yes"));
        assert!(!text.contains("> "));
    }

    #[test]
    fn test_prompt_dialog_shows_field_and_cursor() {
        let mut dialog = shown("Enter device IMEI", DialogKind::Prompt);
        for c in "12345".chars() {
            dialog.edit(TextEdit::Insert(c));
        }
        let (text, mut terminal) = render(&dialog, 100, 20);
        assert!(text.contains("Enter device IMEI"));
        assert!(text.contains("> 12345"));
        assert!(text.contains("[ OK ]"));
        assert!(text.contains("enter: submit"));

        let row = text.lines().position(|l| l.contains("> 12345")).unwrap();
        let line = text.lines().nth(row).unwrap();
        let col = line[..line.find("> 12345").unwrap()].chars().count();
        let position = terminal.get_cursor_position().unwrap();
        assert_eq!(usize::from(position.y), row);
        assert_eq!(usize::from(position.x), col + 2 + 5);
    }

    #[test]
    fn test_multiline_instruction() {
        let dialog = shown("Unplug the charger.\nThen press OK.", DialogKind::Instruct);
        let (text, _) = render(&dialog, 80, 20);
        assert!(text.contains("Instruction"));
        assert!(text.contains("Unplug the charger."));
        assert!(text.contains("Then press OK."));
    }
}
