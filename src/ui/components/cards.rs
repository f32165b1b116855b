//! Post card renderer.
//!
//! Each card takes [`CARD_HEIGHT`](crate::app::state::CARD_HEIGHT) rows:
//!
//! ```text
//! ▌ Pothole on Main St                       ✔ resolved
//!   Deep hole in the right lane, two cars already…
//!   maria · 3h ago · ▲ 12  ▼ 2  (+10)
//!   ⌖ 123 Main St, Springfield · 📷 photo
//! [separator]
//! ```

use crate::app::state::CARD_HEIGHT;
use crate::ui::helpers::{self, char_len, clip, fit, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::PostCard;

/// Renders `cards` from `row` and returns the row after the last one.
pub fn render_cards(row: usize, cards: &[PostCard], theme: &Theme, cols: usize) -> usize {
    cards
        .iter()
        .fold(row, |row, card| render_card(row, card, theme, cols))
}

fn render_card(row: usize, card: &PostCard, theme: &Theme, cols: usize) -> usize {
    let base = if card.is_selected {
        format!(
            "{}{}",
            Theme::fg(&theme.colors.selection_fg),
            Theme::bg(&theme.colors.selection_bg)
        )
    } else {
        Theme::fg(&theme.colors.text_normal)
    };
    let inner = cols.saturating_sub(2);

    position_cursor(row, 1);
    print!("{base}{}", if card.is_selected { "▌ " } else { "  " });
    print!("{}", Theme::bold());

    let status = if card.busy {
        "… saving"
    } else if card.resolved {
        "✔ resolved"
    } else {
        ""
    };
    let title_width = inner.saturating_sub(char_len(status) + 1);
    let title = clip(&card.title, title_width);
    helpers::render_highlighted_text(&title, &card.title_highlights, theme, &base, card.is_selected);
    print!("{}", " ".repeat(title_width.saturating_sub(char_len(&title)) + 1));
    if card.resolved && !card.busy && !card.is_selected {
        print!("{}", Theme::fg(&theme.colors.resolved_fg));
    }
    print!("{status}{}", Theme::reset());

    print_line(row + 1, &base, &card.body, inner);

    let meta = format!("{} · {} · {}", card.author, card.age, card.votes);
    let dim = if card.is_selected {
        base.clone()
    } else {
        Theme::fg(&theme.colors.text_dim)
    };
    print_line(row + 2, &dim, &meta, inner);

    let mut extras = Vec::new();
    if let Some(location) = &card.location {
        extras.push(format!("⌖ {location}"));
    }
    if card.has_image {
        extras.push("📷 photo".to_string());
    }
    print_line(row + 3, &dim, &extras.join(" · "), inner);

    position_cursor(row + 4, 1);
    print!("{}", Theme::fg(&theme.colors.border));
    print!("{}", "┄".repeat(cols));
    print!("{}", Theme::reset());

    row + CARD_HEIGHT
}

fn print_line(row: usize, style: &str, text: &str, width: usize) {
    position_cursor(row, 1);
    print!("{style}  {}{}", fit(text, width), Theme::reset());
}
