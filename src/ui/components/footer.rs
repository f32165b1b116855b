//! Footer components: pagination line and keybinding hints.

use crate::ui::helpers::{center_padding, char_len, clip, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{FooterInfo, PaginationInfo};

/// Renders `‹ Page 2 of 5 ›  (23 posts)` centered, with the arrows dimmed at
/// either end of the range.
pub fn render_pagination(row: usize, pagination: &PaginationInfo, theme: &Theme, cols: usize) -> usize {
    let prev = if pagination.page > 1 { "‹" } else { " " };
    let next = if pagination.page < pagination.page_count { "›" } else { " " };
    let noun = if pagination.total == 1 { "post" } else { "posts" };
    let text = format!(
        "{prev} Page {} of {} {next}  ({} {noun})",
        pagination.page, pagination.page_count, pagination.total
    );

    let padding = center_padding(&text, cols);
    position_cursor(row, 1);
    print!("{}", Theme::fg(&theme.colors.text_normal));
    print!("{}{text}", " ".repeat(padding));
    print!("{}", " ".repeat(cols.saturating_sub(padding + char_len(&text))));
    print!("{}", Theme::reset());
    row + 1
}

/// Renders the keybinding hints centered and dimmed, clipped to the width.
pub fn render_footer(row: usize, footer: &FooterInfo, theme: &Theme, cols: usize) -> usize {
    let help_text = clip(&footer.keybindings, cols);
    let text_len = char_len(&help_text);
    let padding = (cols.saturating_sub(text_len)) / 2;

    position_cursor(row, 1);
    print!("{}", Theme::fg(&theme.colors.text_dim));
    print!("{}", " ".repeat(padding));
    print!("{help_text}");
    print!("{}", " ".repeat(cols.saturating_sub(padding + text_len)));
    print!("{}", Theme::reset());
    row + 1
}
