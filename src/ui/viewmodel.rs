//! View model types representing renderable UI state.
//!
//! View models are computed by [`AppState::compute_viewmodel`](crate::app::AppState::compute_viewmodel)
//! and hold display-ready strings only; components never look at the
//! domain types directly.

use crate::app::modes::EditField;

/// Complete UI view model for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UIViewModel {
    pub header: HeaderInfo,

    /// Present while search mode is active.
    pub search_bar: Option<SearchBarInfo>,

    /// Error or success line under the header.
    pub banner: Option<Banner>,

    /// Cards for the visible page, in sort order.
    pub cards: Vec<PostCard>,

    /// Index into `cards` of the selected card.
    pub selected_index: usize,

    pub pagination: PaginationInfo,

    /// The open menu, drawn over the cards.
    pub menu: Option<MenuOverlay>,

    /// The modal dialog, drawn over everything else.
    pub dialog: Option<DialogView>,

    /// Replaces the cards when there is nothing to show.
    pub empty_state: Option<EmptyState>,

    pub footer: FooterInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,
    /// Active sort and status filter, e.g. `"Most Recent · Open"`.
    pub subtitle: String,
    /// Pending user reports; `None` until the first snapshot arrives.
    pub pending_reports: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBarInfo {
    pub query: String,
    /// Whether keystrokes go to the query.
    pub typing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

/// Display information for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub title: String,
    /// Character ranges of `title` matched by the search query.
    pub title_highlights: Vec<(usize, usize)>,
    pub body: String,
    pub author: String,
    /// Relative age, e.g. `"3h ago"`.
    pub age: String,
    pub votes: String,
    /// Address, coordinates or a placeholder; `None` for posts without a location.
    pub location: Option<String>,
    pub has_image: bool,
    pub resolved: bool,
    pub is_selected: bool,
    /// A write for this post is awaiting confirmation.
    pub busy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOverlay {
    pub title: String,
    pub items: Vec<MenuItemView>,
    /// Card the menu belongs to; `None` for the sort menu.
    pub anchor_card: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemView {
    pub label: String,
    pub is_cursor: bool,
    /// Marks the active sort option.
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogView {
    ConfirmDelete {
        post_title: String,
        reason: String,
        error: Option<String>,
        submitting: bool,
    },
    Edit {
        title: String,
        body: String,
        focus: EditField,
        error: Option<String>,
        submitting: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterInfo {
    pub keybindings: String,
}

/// Shown in place of the cards while loading, on failure, or when the
/// filtered set is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub message: String,
    pub subtitle: String,
}
