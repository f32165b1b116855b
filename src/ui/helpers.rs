//! Shared rendering utilities.
//!
//! Widths are counted in characters, never bytes, so titles with accents or
//! symbols line up the same way ASCII ones do.

use crate::ui::theme::Theme;

/// Moves the cursor to a 1-indexed `row` and `col`.
pub fn position_cursor(row: usize, col: usize) {
    print!("\u{1b}[{row};{col}H");
}

/// Number of characters in `text`.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cuts `text` to `width` characters, marking the cut with `…`.
///
/// ```
/// use roadguard_moderator::ui::helpers::clip;
///
/// assert_eq!(clip("Pothole on Main", 7), "Pothol…");
/// assert_eq!(clip("Flood", 7), "Flood");
/// ```
#[must_use]
pub fn clip(text: &str, width: usize) -> String {
    if char_len(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let kept: String = text.chars().take(width - 1).collect();
    format!("{kept}…")
}

/// Clips `text` to `width` and pads it with spaces to exactly `width`.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    let clipped = clip(text, width);
    let pad = width.saturating_sub(char_len(&clipped));
    format!("{clipped}{}", " ".repeat(pad))
}

/// Left padding that centers `text` in `cols`.
#[must_use]
pub fn center_padding(text: &str, cols: usize) -> usize {
    cols.saturating_sub(char_len(text)) / 2
}

/// Prints `text` with the character `ranges` highlighted.
///
/// Highlighting is skipped on the selected card so the selection colors stay
/// readable. `restore` re-applies the surrounding style after each
/// highlighted run.
pub fn render_highlighted_text(
    text: &str,
    ranges: &[(usize, usize)],
    theme: &Theme,
    restore: &str,
    is_selected: bool,
) {
    if ranges.is_empty() || is_selected {
        print!("{text}");
        return;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut current_pos = 0;

    for &(start, end) in ranges {
        let start = start.min(chars.len());
        let end = end.min(chars.len());
        if start < current_pos || start >= end {
            continue;
        }

        let normal_section: String = chars[current_pos..start].iter().collect();
        print!("{normal_section}");

        print!("{}", Theme::fg(&theme.colors.match_highlight_fg));
        print!("{}", Theme::bg(&theme.colors.match_highlight_bg));
        let highlighted_section: String = chars[start..end].iter().collect();
        print!("{highlighted_section}");
        print!("{}{restore}", Theme::reset());

        current_pos = end;
    }

    if current_pos < chars.len() {
        let remaining: String = chars[current_pos..].iter().collect();
        print!("{remaining}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_pads_and_clips_by_characters() {
        assert_eq!(fit("Café", 6), "Café  ");
        assert_eq!(fit("Überschwemmung", 5), "Über…");
        assert_eq!(fit("x", 0), "");
    }

    #[test]
    fn center_padding_ignores_overlong_text() {
        assert_eq!(center_padding("abcd", 10), 3);
        assert_eq!(center_padding("abcdefghijkl", 10), 0);
    }
}
