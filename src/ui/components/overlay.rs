//! Menus and dialogs drawn on top of the cards.
//!
//! Both are framed boxes. Menus sit at the right edge, next to the card
//! they belong to; dialogs are centered in the pane.

use crate::app::modes::EditField;
use crate::ui::helpers::{char_len, fit, position_cursor};
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{DialogView, MenuOverlay};

const MENU_WIDTH: usize = 24;
const DIALOG_MAX_WIDTH: usize = 64;

/// How one line inside a box is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Normal,
    Dim,
    Cursor,
    Error,
}

/// Screen box of an open menu, 1-based and frame included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuRect {
    pub top: usize,
    pub left: usize,
    pub width: usize,
    pub height: usize,
}

/// What a click at a screen cell lands on while a menu is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuHit {
    Outside,
    /// The title or bottom border, or a side of the frame.
    Frame,
    Item(usize),
}

impl MenuRect {
    /// Places `menu` at the right edge, at its anchor card but never over
    /// the bottom border at `border_row`.
    #[must_use]
    pub fn place(menu: &MenuOverlay, anchor: usize, border_row: usize, cols: usize) -> Self {
        let width = MENU_WIDTH.min(cols);
        let height = menu.items.len() + 2;
        Self {
            top: anchor.min(border_row.saturating_sub(height)).max(1),
            left: cols.saturating_sub(width + 1).max(1),
            width,
            height,
        }
    }

    /// Hit-tests the 1-based cell (`row`, `col`).
    #[must_use]
    pub fn hit(&self, row: usize, col: usize) -> MenuHit {
        let inside_rows = (self.top..self.top + self.height).contains(&row);
        let inside_cols = (self.left..self.left + self.width).contains(&col);
        if !inside_rows || !inside_cols {
            return MenuHit::Outside;
        }
        let on_side = col == self.left || col + 1 == self.left + self.width;
        if row == self.top || row + 1 == self.top + self.height || on_side {
            return MenuHit::Frame;
        }
        MenuHit::Item(row - self.top - 1)
    }
}

/// Renders `menu` inside `rect`.
pub fn render_menu(rect: MenuRect, menu: &MenuOverlay, theme: &Theme) {
    let lines: Vec<(LineStyle, String)> = menu
        .items
        .iter()
        .map(|item| {
            let marker = if item.is_active { "● " } else { "  " };
            let style = if item.is_cursor { LineStyle::Cursor } else { LineStyle::Normal };
            (style, format!("{marker}{}", item.label))
        })
        .collect();

    draw_box(rect.top, rect.left, rect.width, &menu.title, &lines, theme);
}

/// Renders `dialog` centered in a `rows` × `cols` pane.
pub fn render_dialog(dialog: &DialogView, theme: &Theme, rows: usize, cols: usize) {
    let width = DIALOG_MAX_WIDTH.min(cols.saturating_sub(4)).max(20);
    let (title, lines) = dialog_lines(dialog, width.saturating_sub(4));
    let height = lines.len() + 2;

    let top = (rows.saturating_sub(height) / 2).max(1);
    let left = (cols.saturating_sub(width) / 2).max(1);
    draw_box(top, left, width, title, &lines, theme);
}

/// Title and body lines of a dialog, wrapped to `inner` columns.
#[must_use]
pub fn dialog_lines(dialog: &DialogView, inner: usize) -> (&'static str, Vec<(LineStyle, String)>) {
    let mut lines = Vec::new();

    let (title, error, submitting) = match dialog {
        DialogView::ConfirmDelete {
            post_title,
            reason,
            error,
            submitting,
        } => {
            lines.push((LineStyle::Normal, format!("Delete \"{post_title}\"?")));
            lines.push((LineStyle::Dim, "This cannot be undone.".to_string()));
            lines.push((LineStyle::Normal, String::new()));
            lines.push((LineStyle::Cursor, format!("Reason: {reason}▏")));
            ("Delete post", error, *submitting)
        }
        DialogView::Edit {
            title,
            body,
            focus,
            error,
            submitting,
        } => {
            let (title_style, body_style) = match focus {
                EditField::Title => (LineStyle::Cursor, LineStyle::Normal),
                EditField::Body => (LineStyle::Normal, LineStyle::Cursor),
            };
            let caret = |field: EditField| if *focus == field { "▏" } else { "" };
            lines.push((title_style, format!("Title: {title}{}", caret(EditField::Title))));
            lines.push((LineStyle::Normal, String::new()));
            for (i, chunk) in wrap(&format!("Body: {body}{}", caret(EditField::Body)), inner)
                .into_iter()
                .enumerate()
            {
                let style = if i == 0 { body_style } else { LineStyle::Normal };
                lines.push((style, chunk));
            }
            ("Edit post", error, *submitting)
        }
    };

    lines.push((LineStyle::Normal, String::new()));
    if let Some(error) = error {
        lines.push((LineStyle::Error, error.clone()));
    }
    if submitting {
        lines.push((LineStyle::Dim, "Saving…".to_string()));
    }

    (title, lines)
}

/// Splits `text` into chunks of at most `width` characters, at most four.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut chunks: Vec<String> = chars.chunks(width).map(|c| c.iter().collect()).collect();
    if chunks.len() > 4 {
        chunks.truncate(4);
        if let Some(last) = chunks.last_mut() {
            last.pop();
            last.push('…');
        }
    }
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

fn draw_box(top: usize, left: usize, width: usize, title: &str, lines: &[(LineStyle, String)], theme: &Theme) {
    let inner = width.saturating_sub(2);
    let border = Theme::fg(&theme.colors.overlay_border);

    let label = format!(" {title} ");
    position_cursor(top, left);
    print!("{border}┌{label}{}┐", "─".repeat(inner.saturating_sub(char_len(&label))));
    print!("{}", Theme::reset());

    for (offset, (style, text)) in lines.iter().enumerate() {
        position_cursor(top + 1 + offset, left);
        print!("{border}│{}", Theme::reset());
        match style {
            LineStyle::Normal => print!("{}", Theme::fg(&theme.colors.text_normal)),
            LineStyle::Dim => print!("{}", Theme::fg(&theme.colors.text_dim)),
            LineStyle::Cursor => print!(
                "{}{}",
                Theme::fg(&theme.colors.selection_fg),
                Theme::bg(&theme.colors.selection_bg)
            ),
            LineStyle::Error => print!("{}{}", Theme::bold(), Theme::fg(&theme.colors.error_fg)),
        }
        print!(" {}", fit(text, inner.saturating_sub(1)));
        print!("{}{border}│{}", Theme::reset(), Theme::reset());
    }

    position_cursor(top + 1 + lines.len(), left);
    print!("{border}└{}┘", "─".repeat(inner));
    print!("{}", Theme::reset());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_dialog_shows_inline_error() {
        let dialog = DialogView::ConfirmDelete {
            post_title: "Pothole".into(),
            reason: String::new(),
            error: Some("a reason is required to delete a post".into()),
            submitting: false,
        };
        let (title, lines) = dialog_lines(&dialog, 40);
        assert_eq!(title, "Delete post");
        assert!(lines
            .iter()
            .any(|(style, text)| *style == LineStyle::Error && text.contains("reason is required")));
        assert!(!lines.iter().any(|(_, text)| text == "Saving…"));
    }

    #[test]
    fn edit_dialog_marks_focused_field() {
        let dialog = DialogView::Edit {
            title: "Flood".into(),
            body: "River Rd".into(),
            focus: EditField::Body,
            error: None,
            submitting: true,
        };
        let (_, lines) = dialog_lines(&dialog, 40);
        assert_eq!(lines[0], (LineStyle::Normal, "Title: Flood".to_string()));
        assert_eq!(lines[2], (LineStyle::Cursor, "Body: River Rd▏".to_string()));
        assert_eq!(lines.last().unwrap().1, "Saving…");
    }

    fn sort_menu(items: usize) -> MenuOverlay {
        MenuOverlay {
            title: "Sort".into(),
            items: (0..items)
                .map(|i| crate::ui::viewmodel::MenuItemView {
                    label: format!("option {i}"),
                    is_cursor: i == 0,
                    is_active: false,
                })
                .collect(),
            anchor_card: None,
        }
    }

    #[test]
    fn menu_sits_at_right_edge_above_the_border() {
        let rect = MenuRect::place(&sort_menu(4), 30, 32, 80);
        assert_eq!(rect, MenuRect { top: 26, left: 55, width: 24, height: 6 });
    }

    #[test]
    fn clicks_resolve_to_items_frame_or_outside() {
        let rect = MenuRect::place(&sort_menu(4), 5, 40, 80);
        assert_eq!(rect.hit(5, 60), MenuHit::Frame);
        assert_eq!(rect.hit(6, 60), MenuHit::Item(0));
        assert_eq!(rect.hit(9, 60), MenuHit::Item(3));
        assert_eq!(rect.hit(10, 60), MenuHit::Frame);
        assert_eq!(rect.hit(7, 55), MenuHit::Frame);
        assert_eq!(rect.hit(7, 78), MenuHit::Frame);
        assert_eq!(rect.hit(7, 54), MenuHit::Outside);
        assert_eq!(rect.hit(11, 60), MenuHit::Outside);
    }

    #[test]
    fn long_body_wraps_and_is_capped() {
        let chunks = wrap(&"x".repeat(100), 10);
        assert_eq!(chunks.len(), 4);
        assert!(chunks[3].ends_with('…'));
    }
}
