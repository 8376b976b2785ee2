// Colors for the configurator
//
// One fixed dark palette. Every render function takes colors from here so
// nothing in the views hardcodes a color.

use ratatui::style::Color;
use ratatui::widgets::BorderType;

#[derive(Debug, Clone)]
pub struct Theme {
    pub foreground: Color,
    pub background: Color,
    pub border: Color,
    pub title: Color,
    pub highlight: Color,
    pub selection_bg: Color,
    pub accent: Color,
    pub muted: Color,
    pub price: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub status_bar: Color,
    pub border_type: BorderType,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            foreground: Color::Rgb(220, 223, 228),
            background: Color::Rgb(24, 26, 31),
            border: Color::Rgb(92, 99, 112),
            title: Color::Rgb(97, 175, 239),
            highlight: Color::Rgb(229, 192, 123),
            selection_bg: Color::Rgb(44, 50, 60),
            accent: Color::Rgb(198, 120, 221),
            muted: Color::Rgb(127, 132, 142),
            price: Color::Rgb(152, 195, 121),
            success: Color::Rgb(152, 195, 121),
            warning: Color::Rgb(229, 192, 123),
            error: Color::Rgb(224, 108, 117),
            status_bar: Color::Rgb(171, 178, 191),
            border_type: BorderType::Rounded,
        }
    }
}
