//! Application state and view model computation.
//!
//! [`AppState`] is the feed view-model: it owns the working set fetched from
//! the remote store, the sort/filter/page selection, the menu and dialog
//! state, and the bookkeeping for requests still in flight. Everything the
//! renderer shows is derived from it by [`AppState::compute_viewmodel`].

use super::actions::Action;
use super::modes::{Dialog, InputMode, MenuState, PostMenuItem, SearchFocus};
use crate::domain::{GeoPoint, Post, PostId, PostPatch};
use crate::feed::{paginate, FeedFilter, FeedPage, SortOption, StatusFilter, DEFAULT_PAGE_SIZE};
use crate::gateway::{RequestId, SubscriptionId, Subscriptions};
use crate::geo::MapAdapter;
use crate::ui::theme::Theme;
use crate::ui::viewmodel::{
    Banner, BannerKind, DialogView, EmptyState, FooterInfo, HeaderInfo, MenuItemView, MenuOverlay,
    PaginationInfo, PostCard, SearchBarInfo, UIViewModel,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Rows taken by one post card, including its separator.
pub const CARD_HEIGHT: usize = 5;

/// Rows of chrome around the cards in normal mode.
const CHROME_ROWS: usize = 7;

/// Extra rows taken by the search bar.
const SEARCH_BAR_ROWS: usize = 3;

/// Tolerance applied to deadlines when a timer fires.
const TIMER_SLACK_MS: i64 = 50;

/// Feed settings taken from the plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub posts_path: String,
    pub reports_path: String,
    pub page_size: usize,
    /// Lifetime of success messages.
    pub flash_secs: u64,
    /// Poll interval of subscriptions.
    pub poll_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            posts_path: "posts".to_string(),
            reports_path: "reports".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            flash_secs: 3,
            poll_secs: 15,
        }
    }
}

/// A request awaiting its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOp {
    /// Bulk read of the posts collection.
    LoadPosts,
    /// Removal of a post; `reason` is the moderator's justification.
    Delete { post_id: PostId, reason: String },
    /// Partial update of a post.
    Patch { post_id: PostId, patch: PostPatch },
}

/// A transient success message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// The feed view-model.
#[derive(Debug)]
pub struct AppState {
    /// Working set in fetch order.
    pub posts: Vec<Post>,

    /// Whether the mount-time read has been issued.
    pub mounted: bool,

    /// True while the posts read is outstanding.
    pub loading: bool,

    /// Message of a failed read, shown in the empty state.
    pub load_error: Option<String>,

    /// Fatal configuration problem; nothing is fetched while set.
    pub config_error: Option<String>,

    pub sort: SortOption,

    /// Requested 1-based page; clamped whenever the view is refreshed.
    pub page: usize,

    pub filter: FeedFilter,

    /// Derived: filtered, sorted and windowed working set.
    pub feed: FeedPage,

    /// Index of the selected card within the visible page.
    pub selected_index: usize,

    pub input_mode: InputMode,

    pub menu: MenuState,

    pub dialog: Dialog,

    pub flash: Option<Flash>,

    pub error_banner: Option<String>,

    pub maps: MapAdapter,

    /// Requests in flight, keyed by request id.
    pub pending: HashMap<RequestId, PendingOp>,

    pub subscriptions: Subscriptions,

    pub reports_subscription: Option<SubscriptionId>,

    /// Reports awaiting review; `None` until the first snapshot.
    pub pending_reports: Option<usize>,

    /// Deadline of the armed runtime timer.
    pub timer_deadline: Option<DateTime<Utc>>,

    pub theme: Theme,

    pub settings: FeedSettings,

    next_request_id: RequestId,

    /// Identity and locations of the visible posts at the last map pass.
    last_visible: Vec<(PostId, Option<GeoPoint>)>,
}

impl AppState {
    /// Creates an unmounted state with an empty working set.
    ///
    /// ```
    /// use roadguard_moderator::app::state::{AppState, FeedSettings};
    /// use roadguard_moderator::geo::MapAdapter;
    /// use roadguard_moderator::ui::Theme;
    ///
    /// let state = AppState::new(FeedSettings::default(), Theme::default(), MapAdapter::new(None));
    /// assert!(!state.mounted);
    /// assert_eq!(state.page, 1);
    /// ```
    #[must_use]
    pub fn new(settings: FeedSettings, theme: Theme, maps: MapAdapter) -> Self {
        let mut settings = settings;
        settings.page_size = settings.page_size.max(1);

        Self {
            posts: vec![],
            mounted: false,
            loading: false,
            load_error: None,
            config_error: None,
            sort: SortOption::default(),
            page: 1,
            filter: FeedFilter::default(),
            feed: paginate(&[], SortOption::default(), 1, settings.page_size),
            selected_index: 0,
            input_mode: InputMode::Normal,
            menu: MenuState::Closed,
            dialog: Dialog::None,
            flash: None,
            error_banner: None,
            maps,
            pending: HashMap::new(),
            subscriptions: Subscriptions::new(),
            reports_subscription: None,
            pending_reports: None,
            timer_deadline: None,
            theme,
            settings,
            next_request_id: 0,
            last_visible: vec![],
        }
    }

    /// Allocates the next request id.
    pub fn next_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Store path of one post.
    #[must_use]
    pub fn post_path(&self, post_id: &str) -> String {
        format!("{}/{post_id}", self.settings.posts_path.trim_end_matches('/'))
    }

    #[must_use]
    pub fn visible(&self) -> &[Post] {
        self.feed.visible()
    }

    #[must_use]
    pub fn selected_post(&self) -> Option<&Post> {
        self.visible().get(self.selected_index)
    }

    #[must_use]
    pub fn find_post(&self, post_id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == post_id)
    }

    /// Whether a write for `post_id` is awaiting confirmation.
    #[must_use]
    pub fn is_busy(&self, post_id: &str) -> bool {
        self.pending.values().any(|op| match op {
            PendingOp::LoadPosts => false,
            PendingOp::Delete { post_id: id, .. } | PendingOp::Patch { post_id: id, .. } => {
                id == post_id
            }
        })
    }

    /// Moves selection down within the visible page, wrapping to the top.
    pub fn move_selection_down(&mut self) {
        let len = self.visible().len();
        if len > 0 {
            self.selected_index = (self.selected_index + 1) % len;
        }
    }

    /// Moves selection up within the visible page, wrapping to the bottom.
    pub fn move_selection_up(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        self.selected_index = if self.selected_index == 0 {
            len - 1
        } else {
            self.selected_index - 1
        };
    }

    /// Re-derives the visible page and runs a map pass if it changed.
    ///
    /// Never touches the remote store. Returns the mapping-service requests
    /// the pass produced.
    pub fn refresh_view(&mut self) -> Vec<Action> {
        let _span = tracing::debug_span!(
            "refresh_view",
            posts = self.posts.len(),
            sort = self.sort.label(),
            page = self.page
        )
        .entered();

        let filtered = self.filter.apply(&self.posts);
        self.feed = paginate(&filtered, self.sort, self.page, self.settings.page_size);
        self.page = self.feed.page;

        let visible_len = self.visible().len();
        self.selected_index = if visible_len == 0 {
            0
        } else {
            self.selected_index.min(visible_len - 1)
        };

        let signature: Vec<(PostId, Option<GeoPoint>)> = self
            .visible()
            .iter()
            .map(|p| (p.id.clone(), p.location))
            .collect();
        if signature == self.last_visible {
            return vec![];
        }
        self.last_visible = signature;

        tracing::debug!(
            page = self.feed.page,
            page_count = self.feed.page_count,
            visible = visible_len,
            "visible slice changed"
        );

        let visible = self.feed.visible().to_vec();
        self.maps.sync_visible(&visible).into_iter().map(Action::Map).collect()
    }

    /// Shows a success message until `flash_secs` after `now`.
    pub fn set_flash(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        let secs = i64::try_from(self.settings.flash_secs).unwrap_or(3).min(86_400);
        self.flash = Some(Flash {
            message: message.into(),
            expires_at: now + Duration::seconds(secs),
        });
    }

    /// Handles a fired runtime timer: expires the flash message and starts
    /// due subscription polls.
    pub fn on_timer(&mut self, now: DateTime<Utc>) -> Vec<Action> {
        self.timer_deadline = None;
        let horizon = now + Duration::milliseconds(TIMER_SLACK_MS);

        if self.flash.as_ref().is_some_and(|f| f.expires_at <= horizon) {
            tracing::debug!("flash message expired");
            self.flash = None;
        }

        let due = self.subscriptions.take_due(horizon);
        let mut actions: Vec<Action> = due
            .into_iter()
            .map(|(subscription, path)| {
                Action::Gateway(crate::gateway::GatewayRequest::Poll {
                    request_id: self.next_request_id(),
                    subscription,
                    path,
                })
            })
            .collect();
        actions.extend(self.arm_timer(now));
        actions
    }

    /// Arms the runtime timer for the earliest pending deadline, unless an
    /// earlier or equal timer is already armed.
    pub fn arm_timer(&mut self, now: DateTime<Utc>) -> Option<Action> {
        let flash = self.flash.as_ref().map(|f| f.expires_at);
        let deadline = match (flash, self.subscriptions.next_deadline()) {
            (Some(a), Some(b)) => a.min(b),
            (Some(d), None) | (None, Some(d)) => d,
            (None, None) => return None,
        };

        if self.timer_deadline.is_some_and(|armed| armed <= deadline) {
            return None;
        }
        self.timer_deadline = Some(deadline);

        #[allow(clippy::cast_precision_loss)]
        let secs = ((deadline - now).num_milliseconds().max(0) as f64) / 1000.0;
        tracing::trace!(secs, "timer armed");
        Some(Action::ScheduleTimer { secs })
    }

    /// Computes a renderable view model for a `rows` × `cols` pane.
    #[must_use]
    pub fn compute_viewmodel(&self, rows: usize, cols: usize, now: DateTime<Utc>) -> UIViewModel {
        let visible = self.visible();

        let fit = (self.available_rows(rows) / CARD_HEIGHT).max(1);
        let start = if self.selected_index >= fit {
            self.selected_index + 1 - fit
        } else {
            0
        };
        let end = (start + fit).min(visible.len());

        let cards: Vec<PostCard> = visible[start..end]
            .iter()
            .enumerate()
            .map(|(offset, post)| self.compute_card(post, start + offset, cols, now))
            .collect();

        let anchor = |post_id: &str| {
            visible[start..end]
                .iter()
                .position(|p| p.id == post_id)
        };

        UIViewModel {
            header: self.compute_header(),
            search_bar: self.compute_search_bar(),
            banner: self.compute_banner(),
            cards,
            selected_index: self.selected_index.saturating_sub(start),
            pagination: PaginationInfo {
                page: self.feed.page,
                page_count: self.feed.page_count,
                total: self.feed.sorted.len(),
            },
            menu: self.compute_menu(anchor),
            dialog: self.compute_dialog(),
            empty_state: self.compute_empty_state(),
            footer: self.compute_footer(),
        }
    }

    fn compute_card(&self, post: &Post, index: usize, cols: usize, now: DateTime<Utc>) -> PostCard {
        let body_width = cols.saturating_sub(6).max(10);

        let location = post.location.map(|point| {
            self.maps
                .address_for(&post.id)
                .map_or_else(|| point.display(), |slot| slot.text().to_string())
        });

        PostCard {
            title: post.title.clone(),
            title_highlights: self.filter.highlight_ranges(&post.title),
            body: truncate(&post.body, body_width),
            author: post.author.clone(),
            age: post.time_ago(now),
            votes: format!("▲ {}  ▼ {}  ({:+})", post.upvotes, post.downvotes, post.score()),
            location,
            has_image: post.image_url.is_some(),
            resolved: post.resolved,
            is_selected: index == self.selected_index,
            busy: self.is_busy(&post.id),
        }
    }

    fn compute_header(&self) -> HeaderInfo {
        let mut subtitle = self.sort.label().to_string();
        if self.filter.status != StatusFilter::All {
            subtitle.push_str(" · ");
            subtitle.push_str(self.filter.status.label());
        }
        HeaderInfo {
            title: format!(" RoadGuard · Posts ({}) ", self.feed.sorted.len()),
            subtitle,
            pending_reports: self.pending_reports,
        }
    }

    fn compute_search_bar(&self) -> Option<SearchBarInfo> {
        match self.input_mode {
            InputMode::Search(focus) => Some(SearchBarInfo {
                query: self.filter.query.clone(),
                typing: focus == SearchFocus::Typing,
            }),
            InputMode::Normal => None,
        }
    }

    fn compute_banner(&self) -> Option<Banner> {
        if let Some(message) = &self.error_banner {
            return Some(Banner {
                kind: BannerKind::Error,
                message: message.clone(),
            });
        }
        self.flash.as_ref().map(|flash| Banner {
            kind: BannerKind::Success,
            message: flash.message.clone(),
        })
    }

    fn compute_menu(&self, anchor: impl Fn(&str) -> Option<usize>) -> Option<MenuOverlay> {
        match &self.menu {
            MenuState::Closed => None,
            MenuState::Sort { cursor } => Some(MenuOverlay {
                title: "Sort by".to_string(),
                items: SortOption::ALL
                    .iter()
                    .enumerate()
                    .map(|(i, option)| MenuItemView {
                        label: option.label().to_string(),
                        is_cursor: i == *cursor,
                        is_active: *option == self.sort,
                    })
                    .collect(),
                anchor_card: None,
            }),
            MenuState::Post { post_id, cursor } => Some(MenuOverlay {
                title: "Actions".to_string(),
                items: PostMenuItem::ALL
                    .iter()
                    .enumerate()
                    .map(|(i, item)| MenuItemView {
                        label: item.label().to_string(),
                        is_cursor: i == *cursor,
                        is_active: false,
                    })
                    .collect(),
                anchor_card: anchor(post_id),
            }),
        }
    }

    fn compute_dialog(&self) -> Option<DialogView> {
        match &self.dialog {
            Dialog::None => None,
            Dialog::ConfirmDelete {
                post_id,
                reason,
                error,
                submitting,
            } => Some(DialogView::ConfirmDelete {
                post_title: self
                    .find_post(post_id)
                    .map_or_else(|| post_id.clone(), |p| p.title.clone()),
                reason: reason.clone(),
                error: error.clone(),
                submitting: *submitting,
            }),
            Dialog::Edit {
                title,
                body,
                field,
                error,
                submitting,
                ..
            } => Some(DialogView::Edit {
                title: title.clone(),
                body: body.clone(),
                focus: *field,
                error: error.clone(),
                submitting: *submitting,
            }),
        }
    }

    fn compute_empty_state(&self) -> Option<EmptyState> {
        if !self.visible().is_empty() {
            return None;
        }

        let (message, subtitle) = if let Some(error) = &self.config_error {
            ("Plugin is not configured".to_string(), error.clone())
        } else if self.loading || !self.mounted {
            ("Loading posts…".to_string(), String::new())
        } else if let Some(error) = &self.load_error {
            ("Failed to load posts".to_string(), error.clone())
        } else if self.posts.is_empty() || self.filter.is_empty() {
            ("No posts yet".to_string(), "Reports from the app will appear here".to_string())
        } else {
            ("No posts match".to_string(), "Press Esc to clear the search or f to change the filter".to_string())
        };

        Some(EmptyState { message, subtitle })
    }

    fn compute_footer(&self) -> FooterInfo {
        let keybindings = if self.dialog.is_open() {
            match self.dialog {
                Dialog::Edit { .. } => "Tab: switch field  Enter: save  Esc: cancel",
                _ => "Type a reason  Enter: delete  Esc: cancel",
            }
        } else if self.menu.is_open() {
            "j/k: move  Enter: select  Esc: close"
        } else {
            match self.input_mode {
                InputMode::Search(SearchFocus::Typing) => "Esc: exit search  Enter: browse results  Type to filter",
                InputMode::Search(SearchFocus::Navigating) => {
                    "Esc: exit search  /: edit query  j/k: move  Enter: actions"
                }
                InputMode::Normal => {
                    "j/k: move  h/l: page  Enter: actions  s: sort  f: filter  /: search  r: reload  q: quit"
                }
            }
        };

        FooterInfo {
            keybindings: keybindings.to_string(),
        }
    }

    fn available_rows(&self, total_rows: usize) -> usize {
        let chrome = match self.input_mode {
            InputMode::Normal => CHROME_ROWS,
            InputMode::Search(_) => CHROME_ROWS + SEARCH_BAR_ROWS,
        };
        total_rows.saturating_sub(chrome)
    }
}

/// Shortens `text` to `max` characters on one line, marking the cut with `…`.
fn truncate(text: &str, max: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let kept: String = single_line.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
