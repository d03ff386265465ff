use crate::theme::Theme;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::Paragraph,
};
use semiauto_core::session::{Notification, NotificationLevel};

pub fn draw(f: &mut Frame, area: Rect, notification: &Notification, theme: &Theme) {
    let style = match notification.level {
        NotificationLevel::Info => Style::default().fg(theme.hint),
        NotificationLevel::Error => Style::default()
            .fg(theme.error)
            .add_modifier(Modifier::BOLD),
    };
    // One row only; multi-line server text is flattened.
    let text = notification.text.replace('\n', " ");
    f.render_widget(Paragraph::new(Span::styled(format!(" {text}"), style)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::buffer_text;
    use ratatui::{Terminal, backend::TestBackend, style::Color};
    use semiauto_core::config::ThemeConfig;

    #[test]
    fn test_error_notification_is_red() {
        let theme = Theme::from_config(&ThemeConfig::default());
        let notification = Notification::error("Received unknown message from server: x");
        let mut terminal = Terminal::new(TestBackend::new(60, 1)).unwrap();
        terminal
            .draw(|f| draw(f, f.area(), &notification, &theme))
            .unwrap();

        let buffer = terminal.backend().buffer();
        assert!(buffer_text(buffer).contains("Received unknown message"));
        let (x, y): (u16, u16) = (1, 0);
        assert_eq!(buffer[(x, y)].fg, Color::Red);
    }

    #[test]
    fn test_multiline_text_is_flattened() {
        let theme = Theme::from_config(&ThemeConfig::default());
        let notification = Notification::info("Running\ntests");
        let mut terminal = Terminal::new(TestBackend::new(30, 1)).unwrap();
        terminal
            .draw(|f| draw(f, f.area(), &notification, &theme))
            .unwrap();
        assert!(buffer_text(terminal.backend().buffer()).starts_with(" Running tests"));
    }
}
