//! Theme management and ANSI escape sequence generation.
//!
//! Two palettes ship with the plugin and custom palettes can be loaded from
//! TOML files. Colors are hex strings turned into 24-bit ANSI sequences at
//! render time.
//!
//! # Built-in Themes
//!
//! - `roadguard-night`: Dark palette (default)
//! - `roadguard-day`: Light palette
//!
//! # TOML Format
//!
//! ```toml
//! name = "my-theme"
//!
//! [colors]
//! header_fg = "#e6edf3"
//! header_bg = "#1f2a37"          # optional
//! selection_fg = "#0d1117"
//! selection_bg = "#f0b429"
//! text_normal = "#e6edf3"
//! text_dim = "#7d8590"
//! border = "#30363d"
//! search_bar_border = "#f0b429"
//! match_highlight_fg = "#0d1117"
//! match_highlight_bg = "#79c0ff"
//! empty_state_fg = "#79c0ff"
//! badge_fg = "#0d1117"
//! badge_bg = "#ff7b72"
//! resolved_fg = "#56d364"
//! error_fg = "#ff7b72"
//! success_fg = "#56d364"
//! overlay_border = "#f0b429"
//! ```

use crate::domain::ModeratorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the theme used when none is configured.
pub const DEFAULT_THEME: &str = "roadguard-night";

/// Color scheme configuration for UI rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

/// Color definitions for all UI elements, as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeColors {
    pub header_fg: String,
    #[serde(default)]
    pub header_bg: Option<String>,

    /// Selected card foreground.
    pub selection_fg: String,
    /// Selected card background.
    pub selection_bg: String,

    pub text_normal: String,
    /// Secondary text: metadata lines, footer, placeholders.
    pub text_dim: String,

    pub border: String,
    pub search_bar_border: String,
    pub match_highlight_fg: String,
    pub match_highlight_bg: String,
    pub empty_state_fg: String,

    /// Pending-reports badge.
    pub badge_fg: String,
    pub badge_bg: String,

    /// Resolved marker on a card.
    pub resolved_fg: String,

    /// Error banner and inline dialog errors.
    pub error_fg: String,
    /// Success banner.
    pub success_fg: String,

    /// Frame of menus and dialogs.
    pub overlay_border: String,
}

impl Theme {
    /// Loads a built-in theme by name.
    ///
    /// ```
    /// use roadguard_moderator::ui::Theme;
    ///
    /// let theme = Theme::from_name("roadguard-day").unwrap();
    /// assert_eq!(theme.name, "roadguard-day");
    /// assert!(Theme::from_name("solarized").is_none());
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let toml_str = match name {
            "roadguard-night" => include_str!("../../themes/roadguard-night.toml"),
            "roadguard-day" => include_str!("../../themes/roadguard-day.toml"),
            _ => return None,
        };

        toml::from_str(toml_str).ok()
    }

    /// Loads a theme from a TOML file.
    ///
    /// # Errors
    ///
    /// [`ModeratorError::Io`] when the file cannot be read and
    /// [`ModeratorError::Theme`] when it does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModeratorError> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| ModeratorError::Theme(e.to_string()))
    }

    /// Converts a hex color to RGB, falling back to white on malformed input.
    fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
        let hex = hex.trim().trim_start_matches('#');

        if hex.len() != 6 || !hex.is_ascii() {
            return (255, 255, 255);
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).unwrap_or(255);
        (channel(0..2), channel(2..4), channel(4..6))
    }

    /// ANSI 24-bit foreground sequence for `hex`.
    #[must_use]
    pub fn fg(hex: &str) -> String {
        let (r, g, b) = Self::hex_to_rgb(hex);
        format!("\u{001b}[38;2;{r};{g};{b}m")
    }

    /// ANSI 24-bit background sequence for `hex`.
    #[must_use]
    pub fn bg(hex: &str) -> String {
        let (r, g, b) = Self::hex_to_rgb(hex);
        format!("\u{001b}[48;2;{r};{g};{b}m")
    }

    #[must_use]
    pub const fn bold() -> &'static str {
        "\u{001b}[1m"
    }

    #[must_use]
    pub const fn dim() -> &'static str {
        "\u{001b}[2m"
    }

    #[must_use]
    pub const fn reset() -> &'static str {
        "\u{001b}[0m"
    }
}

impl Default for Theme {
    /// Returns `roadguard-night`.
    ///
    /// # Panics
    ///
    /// Panics if the bundled theme fails to parse, which the tests rule out.
    fn default() -> Self {
        Self::from_name(DEFAULT_THEME).expect("bundled roadguard-night theme should always parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bundled_themes_parse() {
        assert_eq!(Theme::default().name, DEFAULT_THEME);
        let day = Theme::from_name("roadguard-day").unwrap();
        assert!(day.colors.header_bg.is_none());
    }

    #[test]
    fn malformed_hex_falls_back_to_white() {
        assert_eq!(Theme::fg("#12"), "\u{1b}[38;2;255;255;255m");
        assert_eq!(Theme::bg("#ff0080"), "\u{1b}[48;2;255;0;128m");
    }

    #[test]
    fn theme_file_errors_are_typed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"broken\"").unwrap();
        assert!(matches!(Theme::from_file(file.path()), Err(ModeratorError::Theme(_))));
        assert!(matches!(
            Theme::from_file("/nonexistent/theme.toml"),
            Err(ModeratorError::Io(_))
        ));
    }
}
