use ratatui::style::{Color, Modifier, Style};
use semiauto_core::config::{NamedColor, ThemeColor};
use semiauto_core::test_list::{Outcome, Verdict};

pub struct Theme {
    pub accent: Color,
    pub running: Color,
    pub pass: Color,
    pub fail: Color,
    pub expected: Color,
    pub muted: Color,
    pub border: Color,
    pub hint: Color,
    pub error: Color,
}

impl Theme {
    pub fn from_config(config: &semiauto_core::config::ThemeConfig) -> Self {
        Self {
            accent: to_ratatui_color(&config.accent),
            running: to_ratatui_color(&config.running),
            pass: to_ratatui_color(&config.pass),
            fail: to_ratatui_color(&config.fail),
            expected: to_ratatui_color(&config.expected),
            muted: to_ratatui_color(&config.muted),
            border: to_ratatui_color(&config.border),
            hint: to_ratatui_color(&config.hint),
            error: to_ratatui_color(&config.error),
        }
    }

    /// Style of a result cell. Expected failures, skips and unexpected
    /// successes keep their verdict but are set apart in italics.
    pub fn outcome_style(&self, outcome: Outcome) -> Style {
        let color = match outcome.verdict() {
            Verdict::Pending => self.muted,
            Verdict::Running => self.running,
            Verdict::Pass if outcome.is_distinct() => self.expected,
            Verdict::Pass => self.pass,
            Verdict::Fail => self.fail,
        };
        let style = Style::default().fg(color);
        match outcome {
            Outcome::Running => style.add_modifier(Modifier::BOLD),
            o if o.is_distinct() => style.add_modifier(Modifier::ITALIC),
            _ => style,
        }
    }
}

fn to_ratatui_color(color: &ThemeColor) -> Color {
    match color {
        ThemeColor::Rgb(r, g, b) => Color::Rgb(*r, *g, *b),
        ThemeColor::Named(named) => match named {
            NamedColor::Black => Color::Black,
            NamedColor::Red => Color::Red,
            NamedColor::Green => Color::Green,
            NamedColor::Yellow => Color::Yellow,
            NamedColor::Blue => Color::Blue,
            NamedColor::Magenta => Color::Magenta,
            NamedColor::Cyan => Color::Cyan,
            NamedColor::White => Color::White,
            NamedColor::Gray => Color::Gray,
            NamedColor::DarkGray => Color::DarkGray,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semiauto_core::config::ThemeConfig;

    #[test]
    fn test_theme_defaults() {
        let theme = Theme::from_config(&ThemeConfig::default());
        assert_eq!(theme.accent, Color::Magenta);
        assert_eq!(theme.running, Color::Yellow);
        assert_eq!(theme.pass, Color::Green);
        assert_eq!(theme.fail, Color::Red);
        assert_eq!(theme.expected, Color::Cyan);
        assert_eq!(theme.muted, Color::Gray);
        assert_eq!(theme.hint, Color::Blue);
        assert_eq!(theme.error, Color::Red);
    }

    #[test]
    fn test_theme_custom() {
        let config = ThemeConfig {
            pass: ThemeColor::Named(NamedColor::Blue),
            fail: ThemeColor::Rgb(255, 0, 255),
            ..ThemeConfig::default()
        };
        let theme = Theme::from_config(&config);
        assert_eq!(theme.pass, Color::Blue);
        assert_eq!(theme.fail, Color::Rgb(255, 0, 255));
        assert_eq!(theme.running, Color::Yellow); // default
    }

    #[test]
    fn test_outcome_styles() {
        let theme = Theme::from_config(&ThemeConfig::default());
        assert_eq!(theme.outcome_style(Outcome::Pass).fg, Some(Color::Green));
        assert_eq!(theme.outcome_style(Outcome::Fail).fg, Some(Color::Red));
        assert_eq!(theme.outcome_style(Outcome::Error).fg, Some(Color::Red));
        assert_eq!(theme.outcome_style(Outcome::NotRun).fg, Some(Color::Gray));

        let skipped = theme.outcome_style(Outcome::Skipped);
        assert_eq!(skipped.fg, Some(Color::Cyan));
        assert!(skipped.add_modifier.contains(Modifier::ITALIC));

        let unexpected = theme.outcome_style(Outcome::UnexpectedSuccess);
        assert_eq!(unexpected.fg, Some(Color::Red));
        assert!(unexpected.add_modifier.contains(Modifier::ITALIC));

        let running = theme.outcome_style(Outcome::Running);
        assert_eq!(running.fg, Some(Color::Yellow));
        assert!(running.add_modifier.contains(Modifier::BOLD));
    }
}
