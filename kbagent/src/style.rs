//! Terminal styles.
use anstyle::AnsiColor;
use anstyle::Color;
use anstyle::Style;

/// Styles.
pub struct Styles {
    /// Section header style.
    pub header: Style,
    /// Knowledge base name style.
    pub name: Style,
    /// Secondary details (ids, URLs).
    pub detail: Style,
    /// Answer text style.
    pub answer: Style,
}

impl Styles {

    /// Load styles.
    pub fn new() -> Self {
        let header = Style::new().bold().underline();
        let name = Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
        let detail = Style::new().dimmed();
        let answer = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));

        Self {
            header,
            name,
            detail,
            answer,
        }
    }
}

impl Default for Styles {
    fn default() -> Self {
        Self::new()
    }
}
