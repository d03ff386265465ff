use crate::theme::Theme;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use semiauto_core::session::ConnectionState;
use semiauto_core::test_list::Summary;

fn state_style(state: ConnectionState, theme: &Theme) -> Style {
    let color = match state {
        ConnectionState::Disconnected => theme.muted,
        ConnectionState::Connecting => theme.running,
        ConnectionState::Connected => theme.pass,
        ConnectionState::Closed => theme.error,
    };
    Style::default().fg(color)
}

pub fn draw(
    f: &mut Frame,
    area: Rect,
    endpoint: &str,
    state: ConnectionState,
    summary: &Summary,
    theme: &Theme,
) {
    let chunks = Layout::horizontal([Constraint::Min(1), Constraint::Length(40)]).split(area);

    let title = Line::from(vec![
        Span::styled(
            " semiauto ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(endpoint, Style::default().fg(theme.muted)),
        Span::raw(" "),
        Span::styled(format!("[{}]", state.as_str()), state_style(state, theme)),
    ]);
    f.render_widget(Paragraph::new(title), chunks[0]);

    let counts = Line::from(vec![
        Span::styled(
            format!("{} passed", summary.passed),
            Style::default().fg(theme.pass),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} failed", summary.failed),
            Style::default().fg(theme.fail),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{}/{} run ", summary.total - summary.not_run, summary.total),
            Style::default().fg(theme.muted),
        ),
    ]);
    f.render_widget(Paragraph::new(counts).alignment(Alignment::Right), chunks[1]);
}
