use ratatui::layout::Rect;

pub mod header;
pub mod notification;
pub mod popup;
pub mod prompt;
pub mod test_table;

const MAX_DIALOG_WIDTH: u16 = 80;

/// Width of a centered dialog: four fifths of the terminal, at most 80 columns.
pub fn dialog_width(terminal_width: u16) -> u16 {
    let scaled = u32::from(terminal_width) * 4 / 5;
    u16::try_from(scaled)
        .unwrap_or(u16::MAX)
        .clamp(1, MAX_DIALOG_WIDTH)
}

/// Center a `width` x `height` rect within `area`, shrinking it to fit.
pub fn centered_fixed_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Flatten a rendered buffer into text, one line per row.
#[cfg(test)]
pub(crate) fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
    let mut output = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            output.push(buffer[(x, y)].symbol().chars().next().unwrap_or(' '));
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_width() {
        assert_eq!(dialog_width(100), 80);
        assert_eq!(dialog_width(20), 16);
        assert_eq!(dialog_width(200), 80);
        assert_eq!(dialog_width(0), 1);
    }

    #[test]
    fn test_centered_fixed_rect() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_fixed_rect(80, 10, area), Rect::new(10, 15, 80, 10));
    }

    #[test]
    fn test_centered_fixed_rect_clamps_to_area() {
        let area = Rect::new(5, 2, 20, 6);
        let rect = centered_fixed_rect(50, 50, area);
        assert_eq!(rect, area);
    }
}
