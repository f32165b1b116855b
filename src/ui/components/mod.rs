//! Composable UI component renderers.
//!
//! # Components
//!
//! - [`header`]: Title bar with the reports badge, and the status line
//! - [`search`]: Search input box
//! - [`cards`]: Post cards for the visible page
//! - [`footer`]: Pagination and keybinding hints
//! - [`overlay`]: Sort/post menus and the delete/edit dialogs
//! - [`empty`]: Message shown in place of the cards
//!
//! # Layout
//!
//! ```text
//! [blank line]
//! [Header]
//! [Status line or banner]
//! [Border]
//! [Search Bar - 3 lines, search mode only]
//! [Cards or empty state]
//! [Pagination]
//! [Border]
//! [Footer]
//! ```
//!
//! The open menu and dialog are drawn last, over the cards.

pub mod cards;
pub mod empty;
pub mod footer;
pub mod header;
pub mod overlay;
pub mod search;

use crate::app::state::CARD_HEIGHT;
use crate::ui::helpers::position_cursor;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::UIViewModel;
pub use overlay::{MenuHit, MenuRect};

/// First card row below the header, status line and border.
const CARDS_TOP: usize = 5;

/// Rows taken by the search bar when it is shown.
const SEARCH_BAR_HEIGHT: usize = 3;

/// Renders a horizontal border line and returns the next row.
fn render_border(row: usize, color: &str, cols: usize) -> usize {
    position_cursor(row, 1);
    print!("{}", Theme::fg(color));
    print!("{}", "─".repeat(cols));
    print!("{}", Theme::reset());
    row + 1
}

/// Renders the whole pane.
pub fn render_layout(vm: &UIViewModel, theme: &Theme, cols: usize, rows: usize) {
    let mut current_row = 2; // row 1 stays blank

    current_row = header::render_header(current_row, &vm.header, theme, cols);
    current_row = header::render_status_line(current_row, &vm.header, vm.banner.as_ref(), theme, cols);
    current_row = render_border(current_row, &theme.colors.border, cols);
    if let Some(search) = &vm.search_bar {
        current_row = search::render_search_bar(current_row, search, theme, cols);
    }
    let cards_top = current_row;
    debug_assert_eq!(cards_top, cards_top_row(vm));

    if let Some(empty) = &vm.empty_state {
        empty::render_empty_state(cards_top + 2, empty, theme, cols);
    } else {
        cards::render_cards(cards_top, &vm.cards, theme, cols);
    }

    let footer_row = rows;
    let border_row = footer_row.saturating_sub(1);
    let pagination_row = border_row.saturating_sub(1);

    footer::render_pagination(pagination_row, &vm.pagination, theme, cols);
    render_border(border_row, &theme.colors.border, cols);
    footer::render_footer(footer_row, &vm.footer, theme, cols);

    if let (Some(menu), Some(rect)) = (&vm.menu, menu_rect(vm, rows, cols)) {
        overlay::render_menu(rect, menu, theme);
    }

    if let Some(dialog) = &vm.dialog {
        overlay::render_dialog(dialog, theme, rows, cols);
    }
}

fn cards_top_row(vm: &UIViewModel) -> usize {
    if vm.search_bar.is_some() {
        CARDS_TOP + SEARCH_BAR_HEIGHT
    } else {
        CARDS_TOP
    }
}

/// Where the open menu of `vm` is drawn in a `rows` × `cols` pane.
#[must_use]
pub fn menu_rect(vm: &UIViewModel, rows: usize, cols: usize) -> Option<MenuRect> {
    let menu = vm.menu.as_ref()?;
    let cards_top = cards_top_row(vm);
    let anchor = menu.anchor_card.map_or(cards_top, |i| cards_top + i * CARD_HEIGHT);
    Some(MenuRect::place(menu, anchor, rows.saturating_sub(1), cols))
}

/// Hit-tests a 1-based click against the open menu of `vm`.
#[must_use]
pub fn menu_hit(vm: &UIViewModel, rows: usize, cols: usize, row: usize, col: usize) -> MenuHit {
    menu_rect(vm, rows, cols).map_or(MenuHit::Outside, |rect| rect.hit(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::modes::{InputMode, MenuState, SearchFocus};
    use crate::app::state::{AppState, FeedSettings};
    use crate::domain::Post;
    use crate::geo::MapAdapter;
    use chrono::Utc;

    fn state() -> AppState {
        let mut state = AppState::new(FeedSettings::default(), Theme::default(), MapAdapter::new(None));
        state.posts = vec![Post::new("a", "Pothole", "Main St"), Post::new("b", "Flood", "River Rd")];
        state.refresh_view();
        state
    }

    #[test]
    fn sort_menu_rows_follow_the_search_bar() {
        let mut state = state();
        state.menu = MenuState::Sort { cursor: 0 };
        let vm = state.compute_viewmodel(40, 80, Utc::now());
        assert_eq!(menu_hit(&vm, 40, 80, 6, 60), MenuHit::Item(0));
        assert_eq!(menu_hit(&vm, 40, 80, 20, 10), MenuHit::Outside);

        state.input_mode = InputMode::Search(SearchFocus::Navigating);
        let vm = state.compute_viewmodel(40, 80, Utc::now());
        assert_eq!(menu_hit(&vm, 40, 80, 6, 60), MenuHit::Outside);
        assert_eq!(menu_hit(&vm, 40, 80, 9, 60), MenuHit::Item(0));
    }

    #[test]
    fn post_menu_opens_beside_its_card() {
        let mut state = state();
        let second = state.visible()[1].id.clone();
        state.menu = MenuState::Post { post_id: second, cursor: 0 };
        let vm = state.compute_viewmodel(40, 80, Utc::now());

        assert_eq!(menu_hit(&vm, 40, 80, 5 + CARD_HEIGHT + 2, 60), MenuHit::Item(1));
    }

    #[test]
    fn closed_menu_is_never_hit() {
        let vm = state().compute_viewmodel(40, 80, Utc::now());
        assert!(menu_rect(&vm, 40, 80).is_none());
        assert_eq!(menu_hit(&vm, 40, 80, 6, 60), MenuHit::Outside);
    }
}
