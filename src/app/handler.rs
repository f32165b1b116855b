//! Event handling and state transitions.
//!
//! The plugin runtime translates Zellij input, timers and web-request
//! completions into [`Event`]s. [`handle_event`] applies one event to the
//! state and returns whether to re-render plus the [`Action`]s to execute.
//!
//! Changing sort, page or filter only re-derives the visible slice. The
//! remote store is read on mount and on an explicit reload, never on render.

use super::modes::{Dialog, EditField, InputMode, MenuState, MenuTarget, PostMenuItem, SearchFocus};
use super::state::PendingOp;
use crate::app::{Action, AppState};
use crate::domain::error::Result;
use crate::domain::{ModeratorError, Post};
use crate::feed::SortOption;
use crate::gateway::{GatewayOp, GatewayRequest, GatewayResponse};
use crate::geo::MapResponse;
use chrono::{DateTime, Utc};

/// Events delivered to the view-model.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The plugin became ready; triggers the one-time posts read.
    Mount { now: DateTime<Utc> },

    /// Selection down within the page.
    KeyDown,
    /// Selection up within the page.
    KeyUp,
    NextPage,
    PrevPage,
    /// Jumps to a 1-based page; out-of-range pages are clamped.
    GoToPage(usize),

    SetSort(SortOption),
    /// Opens the sort menu or a post's menu, replacing any open menu;
    /// `None` closes menus.
    OpenMenu(Option<MenuTarget>),
    ToggleSortMenu,
    /// Toggles the menu of the selected post.
    TogglePostMenu,
    MenuDown,
    MenuUp,
    MenuSelect,
    /// A click on entry `n` of the open menu.
    MenuPick(usize),
    /// A click that did not land on the open menu.
    OutsideClick,
    /// Mouse wheel; closes menus and moves the selection.
    Scroll(isize),

    SearchMode,
    ExitSearch,
    FocusResults,
    Char(char),
    Backspace,
    Escape,
    CycleStatusFilter,

    /// Resolves the selected post.
    MarkResolved,
    /// Opens the delete confirmation for the selected post.
    RequestDelete,
    /// Opens the editor for the selected post.
    RequestEdit,
    DialogSwitchField,
    DialogSubmit,
    DialogCancel,

    /// Re-reads the posts collection.
    Reload,

    /// The store answered a request at `now`.
    GatewayResponse {
        response: GatewayResponse,
        now: DateTime<Utc>,
    },
    MapResponse(MapResponse),

    /// A runtime timer fired.
    Timer { now: DateTime<Utc> },

    CloseFocus,
}

impl Event {
    /// When the event happened, for events that can move a deadline.
    #[must_use]
    pub const fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Mount { now } | Self::Timer { now } | Self::GatewayResponse { now, .. } => Some(*now),
            _ => None,
        }
    }
}

/// Processes an event, mutates application state, and returns actions to execute.
///
/// The boolean is `true` when the UI should re-render.
///
/// # Errors
///
/// Currently infallible; the `Result` leaves room for request encoding
/// failures to surface to the runtime.
///
/// # Example
///
/// ```
/// use roadguard_moderator::app::state::{AppState, FeedSettings};
/// use roadguard_moderator::app::{handle_event, Action, Event};
/// use roadguard_moderator::geo::MapAdapter;
/// use roadguard_moderator::ui::Theme;
///
/// let mut state = AppState::new(FeedSettings::default(), Theme::default(), MapAdapter::new(None));
/// let (render, actions) = handle_event(&mut state, &Event::Mount { now: chrono::Utc::now() })?;
/// assert!(render);
/// assert!(matches!(actions[0], Action::Gateway(_)));
/// # Ok::<(), roadguard_moderator::ModeratorError>(())
/// ```
#[allow(clippy::too_many_lines)]
pub fn handle_event(state: &mut AppState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = ?event_name(event)).entered();

    let (render, mut actions) = match event {
        Event::Mount { now } => mount(state, *now),
        Event::KeyDown => {
            state.move_selection_down();
            (true, vec![])
        }
        Event::KeyUp => {
            state.move_selection_up();
            (true, vec![])
        }
        Event::NextPage => {
            let page = state.page.saturating_add(1);
            set_page(state, page)
        }
        Event::PrevPage => {
            let page = state.page.saturating_sub(1);
            set_page(state, page)
        }
        Event::GoToPage(page) => set_page(state, *page),
        Event::SetSort(option) => set_sort(state, *option),
        Event::OpenMenu(target) => {
            open_menu(state, target.clone());
            (true, vec![])
        }
        Event::ToggleSortMenu => {
            let target = match state.menu {
                MenuState::Sort { .. } => None,
                _ => Some(MenuTarget::Sort),
            };
            open_menu(state, target);
            (true, vec![])
        }
        Event::TogglePostMenu => {
            let Some(post_id) = state.selected_post().map(|p| p.id.clone()) else {
                return Ok((false, vec![]));
            };
            let target = match &state.menu {
                MenuState::Post { post_id: open, .. } if *open == post_id => None,
                _ => Some(MenuTarget::Post(post_id)),
            };
            open_menu(state, target);
            (true, vec![])
        }
        Event::MenuDown => {
            state.menu.move_cursor(1);
            (state.menu.is_open(), vec![])
        }
        Event::MenuUp => {
            state.menu.move_cursor(-1);
            (state.menu.is_open(), vec![])
        }
        Event::MenuSelect => menu_select(state),
        Event::MenuPick(index) => {
            if !state.menu.set_cursor(*index) {
                return Ok((false, vec![]));
            }
            menu_select(state)
        }
        Event::OutsideClick => (close_menu(state), vec![]),
        Event::Scroll(delta) => {
            let closed = close_menu(state);
            if state.dialog.is_open() {
                return Ok((closed, vec![]));
            }
            if *delta > 0 {
                state.move_selection_down();
            } else if *delta < 0 {
                state.move_selection_up();
            }
            (true, vec![])
        }
        Event::SearchMode => {
            tracing::debug!("entering search mode");
            close_menu(state);
            state.input_mode = InputMode::Search(SearchFocus::Typing);
            (true, vec![])
        }
        Event::FocusResults => {
            if state.filter.query.is_empty() {
                state.input_mode = InputMode::Normal;
            } else {
                state.input_mode = InputMode::Search(SearchFocus::Navigating);
            }
            (true, vec![])
        }
        Event::ExitSearch | Event::Escape => {
            if close_menu(state) {
                return Ok((true, vec![]));
            }
            tracing::debug!(query = %state.filter.query, "exiting search mode");
            state.input_mode = InputMode::Normal;
            state.error_banner = None;
            if state.filter.query.is_empty() {
                (true, vec![])
            } else {
                state.filter.query.clear();
                reset_to_first_page(state)
            }
        }
        Event::Char(c) => {
            if let Some(buffer) = state.dialog.active_buffer() {
                buffer.push(*c);
                return Ok((true, vec![]));
            }
            if !matches!(state.input_mode, InputMode::Search(SearchFocus::Typing)) {
                return Ok((false, vec![]));
            }
            state.filter.query.push(*c);
            tracing::trace!(query = %state.filter.query, "search query updated");
            reset_to_first_page(state)
        }
        Event::Backspace => {
            if let Some(buffer) = state.dialog.active_buffer() {
                buffer.pop();
                return Ok((true, vec![]));
            }
            if !matches!(state.input_mode, InputMode::Search(SearchFocus::Typing)) {
                return Ok((false, vec![]));
            }
            state.filter.query.pop();
            reset_to_first_page(state)
        }
        Event::CycleStatusFilter => {
            state.filter.status = state.filter.status.next();
            tracing::debug!(status = state.filter.status.label(), "status filter changed");
            reset_to_first_page(state)
        }
        Event::MarkResolved => with_selected(state, run_post_action, PostMenuItem::Resolve),
        Event::RequestDelete => with_selected(state, run_post_action, PostMenuItem::Delete),
        Event::RequestEdit => with_selected(state, run_post_action, PostMenuItem::Edit),
        Event::DialogSwitchField => {
            if let Dialog::Edit { field, submitting: false, .. } = &mut state.dialog {
                *field = match field {
                    EditField::Title => EditField::Body,
                    EditField::Body => EditField::Title,
                };
                (true, vec![])
            } else {
                (false, vec![])
            }
        }
        Event::DialogSubmit => (state.dialog.is_open(), state.submit_dialog().into_iter().collect()),
        Event::DialogCancel => {
            let submitting = matches!(
                state.dialog,
                Dialog::ConfirmDelete { submitting: true, .. } | Dialog::Edit { submitting: true, .. }
            );
            if state.dialog.is_open() && !submitting {
                state.dialog = Dialog::None;
                (true, vec![])
            } else {
                (false, vec![])
            }
        }
        Event::Reload => reload(state),
        Event::GatewayResponse { response, now } => on_gateway_response(state, response, *now),
        Event::MapResponse(response) => {
            let requests = state.maps.on_response(response.clone());
            (true, requests.into_iter().map(Action::Map).collect())
        }
        Event::Timer { now } => {
            let had_flash = state.flash.is_some();
            let actions = state.on_timer(*now);
            (had_flash != state.flash.is_some(), actions)
        }
        Event::CloseFocus => (false, vec![Action::CloseFocus]),
    };

    if let Some(timer) = event.timestamp().and_then(|now| state.arm_timer(now)) {
        actions.push(timer);
    }

    Ok((render, actions))
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Mount { .. } => "Mount",
        Event::GatewayResponse { .. } => "GatewayResponse",
        Event::MapResponse(_) => "MapResponse",
        Event::Timer { .. } => "Timer",
        Event::Char(_) => "Char",
        _ => "Input",
    }
}

fn mount(state: &mut AppState, now: DateTime<Utc>) -> (bool, Vec<Action>) {
    if state.mounted {
        tracing::debug!("already mounted, ignoring");
        return (false, vec![]);
    }
    state.mounted = true;

    if let Some(error) = &state.config_error {
        tracing::error!(error = %error, "not fetching posts: configuration invalid");
        return (true, vec![]);
    }

    let mut actions = vec![issue_posts_read(state)];

    let reports_path = state.settings.reports_path.clone();
    let subscription = state
        .subscriptions
        .subscribe(reports_path, state.settings.poll_secs, now);
    state.reports_subscription = Some(subscription);
    actions.extend(state.on_timer(now));

    (true, actions)
}

fn issue_posts_read(state: &mut AppState) -> Action {
    let request_id = state.next_request_id();
    state.pending.insert(request_id, PendingOp::LoadPosts);
    state.loading = true;
    tracing::info!(request_id, path = %state.settings.posts_path, "reading posts");
    Action::Gateway(GatewayRequest::ReadAll {
        request_id,
        path: state.settings.posts_path.clone(),
    })
}

fn reload(state: &mut AppState) -> (bool, Vec<Action>) {
    if !state.mounted || state.loading || state.config_error.is_some() {
        return (false, vec![]);
    }
    state.error_banner = None;
    (true, vec![issue_posts_read(state)])
}

fn set_page(state: &mut AppState, page: usize) -> (bool, Vec<Action>) {
    let before = state.page;
    state.page = page;
    let actions = state.refresh_view();
    if state.page != before {
        state.selected_index = 0;
    }
    (state.page != before, actions)
}

fn set_sort(state: &mut AppState, option: SortOption) -> (bool, Vec<Action>) {
    tracing::debug!(sort = option.label(), "sort option changed");
    state.sort = option;
    state.selected_index = 0;
    (true, state.refresh_view())
}

fn reset_to_first_page(state: &mut AppState) -> (bool, Vec<Action>) {
    state.page = 1;
    state.selected_index = 0;
    (true, state.refresh_view())
}

fn open_menu(state: &mut AppState, target: Option<MenuTarget>) {
    state.menu = match target {
        None => MenuState::Closed,
        Some(MenuTarget::Sort) => MenuState::Sort {
            cursor: SortOption::ALL
                .iter()
                .position(|o| *o == state.sort)
                .unwrap_or(0),
        },
        Some(MenuTarget::Post(post_id)) => MenuState::Post { post_id, cursor: 0 },
    };
    tracing::trace!(menu = ?state.menu, "menu state changed");
}

fn close_menu(state: &mut AppState) -> bool {
    let was_open = state.menu.is_open();
    state.menu = MenuState::Closed;
    was_open
}

fn menu_select(state: &mut AppState) -> (bool, Vec<Action>) {
    match std::mem::take(&mut state.menu) {
        MenuState::Closed => (false, vec![]),
        MenuState::Sort { cursor } => {
            let option = SortOption::ALL.get(cursor).copied().unwrap_or_default();
            set_sort(state, option)
        }
        MenuState::Post { post_id, cursor } => {
            let item = PostMenuItem::ALL.get(cursor).copied().unwrap_or(PostMenuItem::Edit);
            run_post_action(state, &post_id, item)
        }
    }
}

fn with_selected(
    state: &mut AppState,
    f: fn(&mut AppState, &str, PostMenuItem) -> (bool, Vec<Action>),
    item: PostMenuItem,
) -> (bool, Vec<Action>) {
    let Some(post_id) = state.selected_post().map(|p: &Post| p.id.clone()) else {
        return (false, vec![]);
    };
    close_menu(state);
    f(state, &post_id, item)
}

fn run_post_action(state: &mut AppState, post_id: &str, item: PostMenuItem) -> (bool, Vec<Action>) {
    tracing::debug!(post_id = %post_id, action = item.label(), "post action selected");
    match item {
        PostMenuItem::Edit => (state.open_edit_dialog(post_id), vec![]),
        PostMenuItem::Delete => (state.open_delete_dialog(post_id), vec![]),
        PostMenuItem::Resolve => match state.mark_resolved(post_id) {
            Some(action) => (true, vec![action]),
            None => (true, vec![]),
        },
    }
}

fn on_gateway_response(state: &mut AppState, response: &GatewayResponse, now: DateTime<Utc>) -> (bool, Vec<Action>) {
    match response {
        GatewayResponse::Snapshot { request_id, records } => {
            if state.pending.remove(request_id).is_none() {
                tracing::debug!(request_id, "snapshot for unknown read ignored");
                return (false, vec![]);
            }
            state.posts = Post::collect_snapshot(records);
            state.loading = false;
            state.load_error = None;
            tracing::info!(posts = state.posts.len(), records = records.len(), "posts loaded");
            (true, state.refresh_view())
        }
        GatewayResponse::Polled {
            subscription,
            records,
            ..
        } => {
            let Some(change) = state.subscriptions.deliver(*subscription, records.clone()) else {
                return (false, vec![]);
            };
            if Some(change.subscription) == state.reports_subscription {
                let pending = count_pending_reports(&change.records);
                tracing::debug!(pending, "reports changed");
                let changed = state.pending_reports != Some(pending);
                state.pending_reports = Some(pending);
                return (changed, vec![]);
            }
            (false, vec![])
        }
        GatewayResponse::Written { request_id } | GatewayResponse::Removed { request_id } => {
            (true, state.complete_write(*request_id, Ok(()), now))
        }
        GatewayResponse::Failed {
            request_id,
            op,
            subscription,
            message,
        } => match op {
            GatewayOp::Poll => {
                tracing::warn!(subscription = ?subscription, error = %message, "subscription poll failed");
                if let Some(subscription) = subscription {
                    state.subscriptions.fail(*subscription);
                }
                (false, vec![])
            }
            GatewayOp::ReadAll => {
                if state.pending.remove(request_id).is_none() {
                    return (false, vec![]);
                }
                let error = ModeratorError::Read {
                    what: "posts",
                    message: message.clone(),
                };
                tracing::error!(error = %error, "reading posts failed");
                state.loading = false;
                if state.posts.is_empty() {
                    state.load_error = Some(error.to_string());
                } else {
                    state.error_banner = Some(error.to_string());
                }
                (true, vec![])
            }
            GatewayOp::Write | GatewayOp::Remove => {
                (true, state.complete_write(*request_id, Err(message.clone()), now))
            }
        },
    }
}

/// Counts reports whose `status` is absent or `"pending"`.
fn count_pending_reports(records: &std::collections::BTreeMap<String, serde_json::Value>) -> usize {
    records
        .values()
        .filter(|report| {
            report
                .get("status")
                .and_then(serde_json::Value::as_str)
                .map_or(true, |status| status == "pending")
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::FeedSettings;
    use crate::geo::MapAdapter;
    use crate::ui::Theme;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn state() -> AppState {
        AppState::new(FeedSettings::default(), Theme::default(), MapAdapter::new(None))
    }

    #[test]
    fn second_mount_is_ignored() {
        let mut state = state();
        let (_, first) = handle_event(&mut state, &Event::Mount { now: Utc::now() }).unwrap();
        let reads = first
            .iter()
            .filter(|a| matches!(a, Action::Gateway(GatewayRequest::ReadAll { .. })))
            .count();
        assert_eq!(reads, 1);

        let (render, second) = handle_event(&mut state, &Event::Mount { now: Utc::now() }).unwrap();
        assert!(!render);
        assert!(second.is_empty());
    }

    #[test]
    fn mount_with_config_error_reads_nothing() {
        let mut state = state();
        state.config_error = Some("database_url is required".into());
        let (_, actions) = handle_event(&mut state, &Event::Mount { now: Utc::now() }).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn opening_a_menu_replaces_the_open_one() {
        let mut state = state();
        state.posts = vec![Post::new("a", "t", "b")];
        state.refresh_view();

        handle_event(&mut state, &Event::ToggleSortMenu).unwrap();
        assert!(matches!(state.menu, MenuState::Sort { .. }));
        handle_event(&mut state, &Event::TogglePostMenu).unwrap();
        assert!(matches!(state.menu, MenuState::Post { .. }));
        handle_event(&mut state, &Event::Scroll(1)).unwrap();
        assert_eq!(state.menu, MenuState::Closed);
    }

    #[test]
    fn pending_reports_count_absent_and_pending_status() {
        let mut records = BTreeMap::new();
        records.insert("r1".to_string(), json!({ "status": "pending" }));
        records.insert("r2".to_string(), json!({ "reason": "spam" }));
        records.insert("r3".to_string(), json!({ "status": "reviewed" }));
        assert_eq!(count_pending_reports(&records), 2);
    }

    #[test]
    fn typing_outside_search_is_ignored() {
        let mut state = state();
        let (render, _) = handle_event(&mut state, &Event::Char('x')).unwrap();
        assert!(!render);
        assert!(state.filter.query.is_empty());
    }

    fn mounted() -> (AppState, Vec<Action>) {
        let mut state = state();
        let (_, actions) = handle_event(&mut state, &Event::Mount { now: Utc::now() }).unwrap();
        (state, actions)
    }

    fn read_id(actions: &[Action]) -> u64 {
        actions
            .iter()
            .find_map(|a| match a {
                Action::Gateway(GatewayRequest::ReadAll { request_id, .. }) => Some(*request_id),
                _ => None,
            })
            .unwrap()
    }

    fn snapshot(n: usize) -> BTreeMap<String, serde_json::Value> {
        (0..n)
            .map(|i| {
                (
                    format!("p{i:02}"),
                    json!({
                        "title": format!("Hazard {i}"),
                        "description": "Pothole",
                        "timestamp": 1_700_000_000_000_i64 + i as i64 * 60_000,
                        "upvotes": i,
                    }),
                )
            })
            .collect()
    }

    fn reply(response: GatewayResponse) -> Event {
        Event::GatewayResponse {
            response,
            now: Utc::now(),
        }
    }

    fn gateway_requests(actions: &[Action]) -> usize {
        actions.iter().filter(|a| matches!(a, Action::Gateway(_))).count()
    }

    #[test]
    fn mount_reads_posts_and_polls_reports() {
        let (state, actions) = mounted();
        assert!(state.loading);
        assert!(matches!(
            actions.as_slice(),
            [
                Action::Gateway(GatewayRequest::ReadAll { path, .. }),
                Action::Gateway(GatewayRequest::Poll { .. }),
            ] if path == "posts"
        ));
    }

    #[test]
    fn snapshot_fills_first_page_newest_first() {
        let (mut state, actions) = mounted();
        let request_id = read_id(&actions);
        handle_event(
            &mut state,
            &reply(GatewayResponse::Snapshot {
                request_id,
                records: snapshot(12),
            }),
        )
        .unwrap();

        assert!(!state.loading);
        assert_eq!(state.posts.len(), 12);
        assert_eq!(state.feed.page_count, 3);
        assert_eq!(state.visible()[0].id, "p11");
    }

    #[test]
    fn sort_page_and_filter_never_read_the_store() {
        let (mut state, actions) = mounted();
        let request_id = read_id(&actions);
        handle_event(
            &mut state,
            &reply(GatewayResponse::Snapshot {
                request_id,
                records: snapshot(12),
            }),
        )
        .unwrap();

        let events = [
            Event::NextPage,
            Event::GoToPage(usize::MAX),
            Event::SetSort(SortOption::MostVoted),
            Event::CycleStatusFilter,
            Event::SearchMode,
            Event::Char('h'),
            Event::ExitSearch,
            Event::PrevPage,
        ];
        for event in &events {
            let (_, actions) = handle_event(&mut state, event).unwrap();
            assert_eq!(gateway_requests(&actions), 0, "{event:?} issued a request");
        }
    }

    #[test]
    fn go_to_page_clamps_and_resets_selection() {
        let (mut state, actions) = mounted();
        let request_id = read_id(&actions);
        handle_event(
            &mut state,
            &reply(GatewayResponse::Snapshot {
                request_id,
                records: snapshot(7),
            }),
        )
        .unwrap();
        state.selected_index = 3;

        handle_event(&mut state, &Event::GoToPage(9)).unwrap();
        assert_eq!(state.page, 2);
        assert_eq!(state.selected_index, 0);

        handle_event(&mut state, &Event::GoToPage(0)).unwrap();
        assert_eq!(state.page, 1);
    }

    #[test]
    fn delete_through_menu_and_dialog() {
        let (mut state, actions) = mounted();
        let request_id = read_id(&actions);
        handle_event(
            &mut state,
            &reply(GatewayResponse::Snapshot {
                request_id,
                records: snapshot(2),
            }),
        )
        .unwrap();

        handle_event(&mut state, &Event::TogglePostMenu).unwrap();
        let delete_at = PostMenuItem::ALL
            .iter()
            .position(|i| *i == PostMenuItem::Delete)
            .unwrap();
        for _ in 0..delete_at {
            handle_event(&mut state, &Event::MenuDown).unwrap();
        }
        handle_event(&mut state, &Event::MenuSelect).unwrap();
        assert!(matches!(state.dialog, Dialog::ConfirmDelete { .. }));
        assert_eq!(state.menu, MenuState::Closed);

        let (_, actions) = handle_event(&mut state, &Event::DialogSubmit).unwrap();
        assert!(actions.is_empty());

        for c in "dup".chars() {
            handle_event(&mut state, &Event::Char(c)).unwrap();
        }
        let (_, actions) = handle_event(&mut state, &Event::DialogSubmit).unwrap();
        let Some(Action::Gateway(GatewayRequest::Remove { request_id, path })) = actions.first() else {
            panic!("expected a removal, got {actions:?}");
        };
        assert_eq!(path, "posts/p01");
        assert_eq!(state.posts.len(), 2);

        handle_event(
            &mut state,
            &reply(GatewayResponse::Removed {
                request_id: *request_id,
            }),
        )
        .unwrap();
        assert_eq!(state.posts.len(), 1);
        assert_eq!(state.dialog, Dialog::None);
        assert!(state.flash.is_some());
    }

    #[test]
    fn failed_reload_keeps_posts_and_shows_banner() {
        let (mut state, actions) = mounted();
        let request_id = read_id(&actions);
        handle_event(
            &mut state,
            &reply(GatewayResponse::Snapshot {
                request_id,
                records: snapshot(3),
            }),
        )
        .unwrap();

        let (_, actions) = handle_event(&mut state, &Event::Reload).unwrap();
        let reload_id = read_id(&actions);
        let (_, again) = handle_event(&mut state, &Event::Reload).unwrap();
        assert_eq!(gateway_requests(&again), 0);

        handle_event(
            &mut state,
            &reply(GatewayResponse::Failed {
                request_id: reload_id,
                op: GatewayOp::ReadAll,
                subscription: None,
                message: "HTTP 503".into(),
            }),
        )
        .unwrap();
        assert_eq!(state.posts.len(), 3);
        assert!(state.load_error.is_none());
        assert_eq!(state.error_banner.as_deref(), Some("Could not read posts: HTTP 503"));
    }

    #[test]
    fn reports_badge_follows_poll_changes() {
        let (mut state, _) = mounted();
        let subscription = state.reports_subscription.unwrap();

        let mut records = BTreeMap::new();
        records.insert("r1".to_string(), json!({ "status": "pending" }));
        let (render, _) = handle_event(
            &mut state,
            &reply(GatewayResponse::Polled {
                request_id: 2,
                subscription,
                records: records.clone(),
            }),
        )
        .unwrap();
        assert!(render);
        assert_eq!(state.pending_reports, Some(1));

        let (render, _) = handle_event(
            &mut state,
            &reply(GatewayResponse::Polled {
                request_id: 3,
                subscription,
                records,
            }),
        )
        .unwrap();
        assert!(!render);
    }

    #[test]
    fn visible_locations_request_the_map_widget_once() {
        use crate::geo::{MapRequest, MapsClient};
        use crate::Secret;

        let client = MapsClient::new("https://maps.test/js", "https://maps.test/geocode", Secret::new("k"));
        let mut state = AppState::new(FeedSettings::default(), Theme::default(), MapAdapter::new(Some(client)));
        let (_, actions) = handle_event(&mut state, &Event::Mount { now: Utc::now() }).unwrap();
        let request_id = read_id(&actions);

        let mut records = snapshot(2);
        for record in records.values_mut() {
            record["location"] = json!({ "latitude": 14.6, "longitude": 121.0 });
        }
        let (_, actions) = handle_event(
            &mut state,
            &reply(GatewayResponse::Snapshot { request_id, records }),
        )
        .unwrap();
        let maps: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                Action::Map(request) => Some(request),
                _ => None,
            })
            .collect();
        assert_eq!(maps, vec![&MapRequest::LoadWidget]);

        let (_, actions) = handle_event(&mut state, &Event::MapResponse(MapResponse::WidgetLoaded)).unwrap();
        let geocodes = actions
            .iter()
            .filter(|a| matches!(a, Action::Map(MapRequest::ReverseGeocode { .. })))
            .count();
        assert_eq!(geocodes, 2);
    }

    #[test]
    fn escape_closes_menu_before_leaving_search() {
        let (mut state, actions) = mounted();
        let request_id = read_id(&actions);
        handle_event(
            &mut state,
            &reply(GatewayResponse::Snapshot {
                request_id,
                records: snapshot(3),
            }),
        )
        .unwrap();

        handle_event(&mut state, &Event::SearchMode).unwrap();
        handle_event(&mut state, &Event::Char('2')).unwrap();
        assert_eq!(state.visible().len(), 1);
        handle_event(&mut state, &Event::FocusResults).unwrap();
        handle_event(&mut state, &Event::TogglePostMenu).unwrap();
        assert!(state.menu.is_open());

        handle_event(&mut state, &Event::Escape).unwrap();
        assert!(!state.menu.is_open());
        assert_eq!(state.input_mode, InputMode::Search(SearchFocus::Navigating));

        handle_event(&mut state, &Event::ExitSearch).unwrap();
        assert_eq!(state.input_mode, InputMode::Normal);
        assert_eq!(state.visible().len(), 3);
    }

    #[test]
    fn outside_click_closes_whichever_menu_is_open() {
        let mut state = state();
        state.posts = vec![Post::new("a", "t", "b")];
        state.refresh_view();

        handle_event(&mut state, &Event::ToggleSortMenu).unwrap();
        let (render, _) = handle_event(&mut state, &Event::OutsideClick).unwrap();
        assert!(render);
        assert_eq!(state.menu, MenuState::Closed);

        handle_event(&mut state, &Event::TogglePostMenu).unwrap();
        handle_event(&mut state, &Event::OutsideClick).unwrap();
        assert_eq!(state.menu, MenuState::Closed);
        assert_eq!(state.dialog, Dialog::None);

        let (render, actions) = handle_event(&mut state, &Event::OutsideClick).unwrap();
        assert!(!render);
        assert!(actions.is_empty());
    }

    #[test]
    fn clicking_a_menu_entry_selects_it() {
        let mut state = state();
        state.posts = vec![Post::new("a", "t", "b")];
        state.refresh_view();

        handle_event(&mut state, &Event::ToggleSortMenu).unwrap();
        let (render, _) = handle_event(&mut state, &Event::MenuPick(SortOption::ALL.len())).unwrap();
        assert!(!render);
        assert!(state.menu.is_open());

        handle_event(&mut state, &Event::MenuPick(1)).unwrap();
        assert_eq!(state.sort, SortOption::ALL[1]);
        assert_eq!(state.menu, MenuState::Closed);

        handle_event(&mut state, &Event::TogglePostMenu).unwrap();
        let delete_at = PostMenuItem::ALL
            .iter()
            .position(|i| *i == PostMenuItem::Delete)
            .unwrap();
        handle_event(&mut state, &Event::MenuPick(delete_at)).unwrap();
        assert!(matches!(state.dialog, Dialog::ConfirmDelete { .. }));
    }

    #[test]
    fn flash_expiry_follows_event_time() {
        let (mut state, actions) = mounted();
        let request_id = read_id(&actions);
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        handle_event(
            &mut state,
            &Event::GatewayResponse {
                response: GatewayResponse::Snapshot {
                    request_id,
                    records: snapshot(2),
                },
                now: t0,
            },
        )
        .unwrap();
        state.subscriptions = crate::gateway::Subscriptions::new();
        state.timer_deadline = None;

        let Action::Gateway(request) = state.edit_post("p00", "Hazard 0 (fixed)", "Pothole").unwrap() else {
            panic!("expected a write");
        };
        let (_, actions) = handle_event(
            &mut state,
            &Event::GatewayResponse {
                response: GatewayResponse::Written {
                    request_id: request.request_id(),
                },
                now: t0,
            },
        )
        .unwrap();
        assert_eq!(actions, vec![Action::ScheduleTimer { secs: 3.0 }]);

        let early = t0 + chrono::Duration::seconds(1);
        handle_event(&mut state, &Event::Timer { now: early }).unwrap();
        assert!(state.flash.is_some());

        let late = t0 + chrono::Duration::seconds(3);
        let (render, _) = handle_event(&mut state, &Event::Timer { now: late }).unwrap();
        assert!(render);
        assert!(state.flash.is_none());
    }
}
