//! Colour and width detection for terminal output.

use owo_colors::{OwoColorize, Style, colors::css};

/// Terminals narrower than this get stacked output instead of tables.
const NARROW_COLUMNS: u16 = 60;

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Check if the terminal is too narrow for tabular output
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < NARROW_COLUMNS)
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as failure (red)
    fn failure(&self) -> String;
    /// Color as info (blue)
    fn info(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn success(&self) -> String {
        paint(self.as_ref(), Style::new().fg::<css::Green>())
    }

    fn warning(&self) -> String {
        paint(self.as_ref(), Style::new().fg::<css::Orange>())
    }

    fn failure(&self) -> String {
        paint(self.as_ref(), Style::new().fg::<css::Crimson>())
    }

    fn info(&self) -> String {
        paint(self.as_ref(), Style::new().fg::<css::LightBlue>())
    }

    fn dim(&self) -> String {
        paint(self.as_ref(), Style::new().dimmed())
    }
}

fn paint(text: &str, style: Style) -> String {
    if supports_color() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}
