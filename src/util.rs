//! Shared display helpers for the CLI tables and the TUI

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncate to at most `max_width` terminal columns, ending with `…` when cut.
///
/// Works on display width, not bytes, so wide characters (CJK, emoji) are
/// never split and never overflow the column.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let room = max_width - 1; // leave a column for the ellipsis
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > room {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Truncate, then right-pad with spaces to exactly `width` columns
pub fn pad_to_width(s: &str, width: usize) -> String {
    let mut out = truncate_to_width(s, width);
    let used = out.width();
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

/// Price for display; unknown prices show a dash
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{:.0} ₽", p),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_shorter_than_max() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each character is two columns wide
        let s = "日本語";
        assert_eq!(truncate_to_width(s, 5), "日本…");
        assert_eq!(truncate_to_width(s, 4), "日…");
        assert!(truncate_to_width(s, 4).width() <= 4);
    }

    #[test]
    fn test_truncate_to_zero() {
        assert_eq!(truncate_to_width("hello", 0), "");
    }

    #[test]
    fn test_pad_fills_columns() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("日", 4).width(), 4);
        assert_eq!(pad_to_width("abcdef", 4), "abc…");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(549.4)), "549 ₽");
        assert_eq!(format_price(None), "—");
    }
}
