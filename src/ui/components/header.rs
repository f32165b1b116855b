//! Header component: title bar and status line.

use crate::ui::helpers::{center_padding, char_len, clip, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{Banner, BannerKind, HeaderInfo};

/// Renders the centered title bar, with the pending-reports badge at the
/// right edge once the first reports snapshot has arrived.
pub fn render_header(row: usize, header: &HeaderInfo, theme: &Theme, cols: usize) -> usize {
    let badge = header
        .pending_reports
        .map(|n| format!(" {n} pending report{} ", if n == 1 { "" } else { "s" }));
    let badge_len = badge.as_deref().map_or(0, char_len);

    let title = clip(&header.title, cols.saturating_sub(badge_len));
    let title_len = char_len(&title);
    let padding = center_padding(&title, cols.saturating_sub(badge_len));

    position_cursor(row, 1);
    print!("{}", Theme::bold());
    print!("{}", Theme::fg(&theme.colors.header_fg));
    if let Some(bg) = &theme.colors.header_bg {
        print!("{}", Theme::bg(bg));
    }

    print!("{}", " ".repeat(padding));
    print!("{title}");
    print!("{}", " ".repeat(cols.saturating_sub(padding + title_len + badge_len)));

    if let Some(badge) = badge {
        print!("{}", Theme::fg(&theme.colors.badge_fg));
        print!("{}", Theme::bg(&theme.colors.badge_bg));
        print!("{badge}");
    }

    print!("{}", Theme::reset());
    row + 1
}

/// Renders the sort/filter subtitle, or the banner in its place when one is
/// showing.
pub fn render_status_line(
    row: usize,
    header: &HeaderInfo,
    banner: Option<&Banner>,
    theme: &Theme,
    cols: usize,
) -> usize {
    position_cursor(row, 1);

    let text = match banner {
        Some(banner) => {
            let (color, icon) = match banner.kind {
                BannerKind::Error => (&theme.colors.error_fg, "✖"),
                BannerKind::Success => (&theme.colors.success_fg, "✔"),
            };
            print!("{}{}", Theme::bold(), Theme::fg(color));
            format!(" {icon} {}", banner.message)
        }
        None => {
            print!("{}", Theme::fg(&theme.colors.text_dim));
            format!(" Sorted by {}", header.subtitle)
        }
    };

    let text = clip(&text, cols);
    print!("{text}");
    print!("{}", " ".repeat(cols.saturating_sub(char_len(&text))));
    print!("{}", Theme::reset());
    row + 1
}
