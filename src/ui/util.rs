use ratatui::layout::Rect;
use std::cmp::min;

/// Keep the head and tail of a long identifier, e.g. `pokt1a...9xyz`.
pub fn short_address(value: &str, head: usize, tail: usize) -> String {
    let trimmed = value.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= head + tail + 3 {
        return trimmed.to_string();
    }
    let prefix: String = chars[..head].iter().collect();
    let suffix: String = chars[chars.len() - tail..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Pretty-print a JSON document, or return it untouched when it is not JSON.
pub fn pretty_json(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| raw.trim().to_string())
}

pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = min(width, area.width);
    let height = min(height, area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
pub mod testing {
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    /// Draw with `render` into an off-screen grid and return its rows.
    pub fn draw<F>(width: u16, height: u16, render: F) -> Vec<String>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(render).unwrap();
        rows(terminal.backend().buffer())
    }

    pub fn rows(buffer: &Buffer) -> Vec<String> {
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_keeps_both_ends() {
        assert_eq!(
            short_address("pokt1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqq9xyz", 8, 4),
            "pokt1qqq...9xyz"
        );
        assert_eq!(short_address(" gw1 ", 8, 4), "gw1");
    }

    #[test]
    fn pretty_json_indents_or_passes_through() {
        assert_eq!(pretty_json(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
        assert_eq!(pretty_json("Error: not json\n"), "Error: not json");
    }

    #[test]
    fn centered_rect_is_clamped_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(50, 50, area), area);
    }
}
