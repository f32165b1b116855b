//! Empty state component renderer.

use crate::ui::helpers::{center_padding, char_len, clip, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::EmptyState;

/// Renders the two-line centered message that replaces the cards.
///
/// `row` is where the message goes; the subtitle follows on the next row.
pub fn render_empty_state(row: usize, empty: &EmptyState, theme: &Theme, cols: usize) {
    let message = clip(&empty.message, cols);
    let msg_padding = center_padding(&message, cols);

    position_cursor(row, 1);
    print!("{}", Theme::fg(&theme.colors.empty_state_fg));
    print!("{}", " ".repeat(msg_padding));
    print!("{message}");
    print!("{}", " ".repeat(cols.saturating_sub(msg_padding + char_len(&message))));
    print!("{}", Theme::reset());

    let subtitle = clip(&empty.subtitle, cols);
    let sub_padding = center_padding(&subtitle, cols);

    position_cursor(row + 1, 1);
    print!("{}", Theme::dim());
    print!("{}", Theme::fg(&theme.colors.text_dim));
    print!("{}", " ".repeat(sub_padding));
    print!("{subtitle}");
    print!("{}", " ".repeat(cols.saturating_sub(sub_padding + char_len(&subtitle))));
    print!("{}", Theme::reset());
}
