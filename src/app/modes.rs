//! Input modes, menus and dialogs.
//!
//! At most one menu is open at a time: [`MenuState`] is a single value, so
//! opening a menu replaces whichever one was open. A [`Dialog`] is modal and
//! captures all key input while it is shown.

use crate::domain::PostId;
use crate::feed::SortOption;

/// Focus state within search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    /// Typing into the query.
    Typing,
    /// Moving through the filtered cards with the query kept.
    Navigating,
}

/// Current input handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search(SearchFocus),
}

/// Actions offered by a post's menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostMenuItem {
    Edit,
    Delete,
    Resolve,
}

impl PostMenuItem {
    pub const ALL: [Self; 3] = [Self::Edit, Self::Delete, Self::Resolve];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit post",
            Self::Delete => "Delete post",
            Self::Resolve => "Mark as resolved",
        }
    }
}

/// Which menu an open request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTarget {
    Sort,
    Post(PostId),
}

/// The single open menu, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Sort { cursor: usize },
    Post { post_id: PostId, cursor: usize },
}

impl MenuState {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Number of entries in the open menu.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Closed => 0,
            Self::Sort { .. } => SortOption::ALL.len(),
            Self::Post { .. } => PostMenuItem::ALL.len(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves the cursor by `delta`, wrapping around.
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.len();
        if let Self::Sort { cursor } | Self::Post { cursor, .. } = self {
            *cursor = wrap(*cursor, delta, len);
        }
    }

    /// Puts the cursor on entry `index`; out-of-range indices are ignored.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        let len = self.len();
        match self {
            Self::Sort { cursor } | Self::Post { cursor, .. } if index < len => {
                *cursor = index;
                true
            }
            _ => false,
        }
    }
}

/// Which edit field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Body,
}

/// The modal dialog, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    None,

    /// Delete confirmation; the reason must be non-blank.
    ConfirmDelete {
        post_id: PostId,
        reason: String,
        error: Option<String>,
        submitting: bool,
    },

    /// Title/body editor prefilled from the post.
    Edit {
        post_id: PostId,
        title: String,
        body: String,
        field: EditField,
        error: Option<String>,
        submitting: bool,
    },
}

impl Dialog {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The text buffer that currently receives typed characters.
    pub fn active_buffer(&mut self) -> Option<&mut String> {
        match self {
            Self::None
            | Self::ConfirmDelete { submitting: true, .. }
            | Self::Edit { submitting: true, .. } => None,
            Self::ConfirmDelete { reason, .. } => Some(reason),
            Self::Edit {
                field: EditField::Title,
                title,
                ..
            } => Some(title),
            Self::Edit {
                field: EditField::Body,
                body,
                ..
            } => Some(body),
        }
    }
}

fn wrap(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = isize::try_from(len).unwrap_or(isize::MAX);
    let cursor = isize::try_from(cursor).unwrap_or(0);
    usize::try_from((cursor + delta).rem_euclid(len)).unwrap_or(0)
}
