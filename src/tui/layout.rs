//! Responsive breakpoints and the screen split.
//!
//! Single source of truth for width thresholds - no magic numbers scattered in render code.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    /// < 80 cols: build summary goes under the list
    Compact,
    /// 80-139 cols: summary beside the list
    Normal,
    /// 140+ cols: wider summary, spec column in the list
    Wide,
}

impl Breakpoint {
    pub fn from_width(width: u16) -> Self {
        match width {
            0..=79 => Breakpoint::Compact,
            80..=139 => Breakpoint::Normal,
            _ => Breakpoint::Wide,
        }
    }

    /// Check if at least this breakpoint (inclusive)
    pub fn at_least(&self, min: Breakpoint) -> bool {
        self.ordinal() >= min.ordinal()
    }

    fn ordinal(&self) -> u8 {
        match self {
            Breakpoint::Compact => 0,
            Breakpoint::Normal => 1,
            Breakpoint::Wide => 2,
        }
    }
}

/// Rows of the log strip, border included
const LOG_HEIGHT: u16 = 6;

/// Areas of the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub breakpoint: Breakpoint,
    pub title: Rect,
    pub tabs: Rect,
    pub filters: Rect,
    pub list: Rect,
    pub summary: Rect,
    pub logs: Rect,
    pub status: Rect,
}

impl AppLayout {
    pub fn compute(area: Rect) -> Self {
        let breakpoint = Breakpoint::from_width(area.width);
        // The log strip is the first thing to go on short terminals
        let log_height = if area.height >= 30 { LOG_HEIGHT } else { 0 };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),          // title
                Constraint::Length(2),          // category tabs
                Constraint::Length(1),          // filter bar
                Constraint::Min(6),             // list + summary
                Constraint::Length(log_height), // log strip
                Constraint::Length(2),          // status bar
            ])
            .split(area);

        let (list, summary) = match breakpoint {
            Breakpoint::Compact => {
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(4), Constraint::Length(7)])
                    .split(rows[3]);
                (parts[0], parts[1])
            }
            Breakpoint::Normal | Breakpoint::Wide => {
                let summary_pct = if breakpoint == Breakpoint::Wide { 35 } else { 40 };
                let parts = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(100 - summary_pct),
                        Constraint::Percentage(summary_pct),
                    ])
                    .split(rows[3]);
                (parts[0], parts[1])
            }
        };

        Self {
            breakpoint,
            title: rows[0],
            tabs: rows[1],
            filters: rows[2],
            list,
            summary,
            logs: rows[4],
            status: rows[5],
        }
    }
}

/// Rectangle of at most `width` x `height`, centered in `area`
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_thresholds() {
        assert_eq!(Breakpoint::from_width(40), Breakpoint::Compact);
        assert_eq!(Breakpoint::from_width(79), Breakpoint::Compact);
        assert_eq!(Breakpoint::from_width(80), Breakpoint::Normal);
        assert_eq!(Breakpoint::from_width(139), Breakpoint::Normal);
        assert_eq!(Breakpoint::from_width(140), Breakpoint::Wide);
    }

    #[test]
    fn at_least_comparisons() {
        let normal = Breakpoint::Normal;
        assert!(normal.at_least(Breakpoint::Compact));
        assert!(normal.at_least(Breakpoint::Normal));
        assert!(!normal.at_least(Breakpoint::Wide));
    }

    #[test]
    fn normal_width_puts_summary_beside_list() {
        let layout = AppLayout::compute(Rect::new(0, 0, 120, 40));
        assert_eq!(layout.list.y, layout.summary.y);
        assert!(layout.summary.x > layout.list.x);
        assert_eq!(layout.list.width + layout.summary.width, 120);
        assert_eq!(layout.logs.height, LOG_HEIGHT);
    }

    #[test]
    fn compact_width_stacks_summary_under_list() {
        let layout = AppLayout::compute(Rect::new(0, 0, 60, 40));
        assert_eq!(layout.list.x, layout.summary.x);
        assert!(layout.summary.y > layout.list.y);
    }

    #[test]
    fn short_terminal_drops_log_strip() {
        let layout = AppLayout::compute(Rect::new(0, 0, 120, 24));
        assert_eq!(layout.logs.height, 0);
        assert_eq!(layout.status.y + layout.status.height, 24);
    }

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(50, 50, area), Rect::new(0, 0, 20, 10));
    }
}
