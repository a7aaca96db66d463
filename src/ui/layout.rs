use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy)]
pub struct UiAreas {
    pub size: Rect,
    pub tab_bar: Rect,
    pub banner: Rect,
    pub main: Rect,
    pub status_line: Rect,
    pub command_line: Rect,
}

/// Screen regions; `banner` is zero-height unless a notification shows
pub fn areas(size: Rect, with_banner: bool) -> UiAreas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(u16::from(with_banner)),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(size);

    UiAreas {
        size,
        tab_bar: vertical[0],
        banner: vertical[1],
        main: vertical[2],
        status_line: vertical[3],
        command_line: vertical[4],
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_takes_a_row_only_when_shown() {
        let size = Rect::new(0, 0, 80, 24);

        let plain = areas(size, false);
        assert_eq!(plain.banner.height, 0);
        assert_eq!(plain.main.height, 21);

        let with_banner = areas(size, true);
        assert_eq!(with_banner.banner.height, 1);
        assert_eq!(with_banner.main.height, 20);
        assert_eq!(with_banner.command_line.y, 23);
    }
}
