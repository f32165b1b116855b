//! Zellij plugin wrapper and entry point.
//!
//! A thin layer between the library and Zellij: it maps Zellij events to
//! library [`Event`]s, runs [`handle_event`], and carries out the returned
//! [`Action`]s with Zellij's web request and timer APIs.
//!
//! # Plugin Lifecycle
//!
//! 1. **Load**: Parse config, initialize tracing, build `AppState`
//! 2. **Permissions**: Request `WebAccess`; once granted, send `Event::Mount`
//! 3. **Update**: Translate keys, mouse, timers and web results
//! 4. **Render**: Call the library renderer
//!
//! # Web Requests
//!
//! Every request carries a context map naming its kind (`gateway` or `map`).
//! Zellij echoes it back in `WebRequestResult`, which is how a reply is
//! routed to the store or the mapping client.
//!
//! # Keybindings
//!
//! Normal mode:
//! - `j`/`k`/arrows: Move selection
//! - `h`/`l`/arrows: Previous/next page; `1`-`9`: jump to page; `g`/`G`: first/last page
//! - `Enter`: Post actions menu
//! - `s`: Sort menu; `f`: cycle status filter
//! - `x`: Mark resolved; `e`: Edit; `d`: Delete
//! - `/`: Search; `r`: Reload; `q`: Close
//!
//! Menus: `j`/`k` move, `Enter` or a click on an entry selects, `Esc` or a
//! click elsewhere closes.
//!
//! Dialogs: type into the focused field, `Tab` switches field, `Enter`
//! submits, `Esc` cancels.

#![allow(clippy::multiple_crate_versions)]

use chrono::Utc;
use std::collections::{BTreeMap, VecDeque};
use zellij_tile::prelude::*;

use roadguard_moderator::app::{Dialog, MenuState};
use roadguard_moderator::gateway::{
    FirebaseRest, GatewayRequest, GatewayResponse, HttpMethod, HttpReply, HttpRequest, RemoteStore,
    RequestContext, CONTEXT_KIND, KIND_GATEWAY,
};
use roadguard_moderator::geo::{MapRequest, MapsClient, KIND_MAP};
use roadguard_moderator::ui::{menu_hit, MenuHit};
use roadguard_moderator::{handle_event, Action, Config, Event, InputMode, SearchFocus};

register_plugin!(State);

/// Plugin state wrapper.
struct State {
    app: roadguard_moderator::AppState,

    /// `None` until a database URL is configured.
    store: Option<FirebaseRest>,

    /// Pane size at the last render, for hit-testing clicks.
    viewport: (usize, usize),
}

impl Default for State {
    fn default() -> Self {
        let default_config = Config::default();
        Self {
            app: roadguard_moderator::initialize(&default_config),
            store: None,
            viewport: (0, 0),
        }
    }
}

impl ZellijPlugin for State {
    fn load(&mut self, configuration: BTreeMap<String, String>) {
        let config = Config::from_zellij(&configuration);
        roadguard_moderator::observability::init_tracing(&config);

        let _guard = tracing::debug_span!("plugin_load").entered();

        tracing::debug!(
            posts_path = %config.posts_path,
            page_size = config.page_size,
            maps = config.maps_api_key.is_some(),
            "parsed configuration"
        );
        self.app = roadguard_moderator::initialize(&config);
        self.store = config.store();

        request_permission(&[PermissionType::WebAccess]);
        subscribe(&[
            EventType::Key,
            EventType::Mouse,
            EventType::Timer,
            EventType::WebRequestResult,
            EventType::PermissionRequestResult,
        ]);

        tracing::debug!("plugin load complete - waiting for permissions");
    }

    fn update(&mut self, event: zellij_tile::prelude::Event) -> bool {
        let event_name = Self::get_event_name(&event);
        let _guard = tracing::debug_span!("plugin_update_event", event_type = %event_name).entered();

        let our_event = match event {
            zellij_tile::prelude::Event::Key(ref key) => match self.map_key_event(key) {
                Some(event) => event,
                None => return false,
            },
            zellij_tile::prelude::Event::Mouse(mouse) => match self.map_mouse_event(mouse) {
                Some(event) => event,
                None => return false,
            },
            zellij_tile::prelude::Event::Timer(_) => Event::Timer { now: Utc::now() },
            zellij_tile::prelude::Event::WebRequestResult(status, _headers, body, context) => {
                match self.map_web_result(status, body, &context) {
                    Some(event) => event,
                    None => return false,
                }
            }
            zellij_tile::prelude::Event::PermissionRequestResult(PermissionStatus::Granted) => {
                tracing::debug!("web access granted - mounting feed");
                Event::Mount { now: Utc::now() }
            }
            zellij_tile::prelude::Event::PermissionRequestResult(PermissionStatus::Denied) => {
                tracing::warn!("web access denied - feed cannot load");
                self.app.config_error = Some("Web access permission was denied".to_string());
                return true;
            }
            _ => return false,
        };

        self.dispatch(our_event)
    }

    fn render(&mut self, rows: usize, cols: usize) {
        self.viewport = (rows, cols);
        roadguard_moderator::ui::render(&self.app, rows, cols);
    }
}

impl State {
    /// Handles `event` and every follow-up event produced while executing
    /// its actions.
    fn dispatch(&mut self, event: Event) -> bool {
        let mut queue = VecDeque::from([event]);
        let mut render = false;

        while let Some(event) = queue.pop_front() {
            match handle_event(&mut self.app, &event) {
                Ok((should_render, actions)) => {
                    tracing::debug!(action_count = actions.len(), should_render, "event handled");
                    render |= should_render;
                    for action in actions {
                        queue.extend(self.execute_action(action));
                    }
                }
                Err(e) => tracing::error!(error = %e, "error handling event"),
            }
        }

        render
    }

    fn get_event_name(event: &zellij_tile::prelude::Event) -> String {
        match event {
            zellij_tile::prelude::Event::Key(key) => format!("Key({:?})", key.bare_key),
            zellij_tile::prelude::Event::Mouse(..) => "Mouse".to_string(),
            zellij_tile::prelude::Event::Timer(..) => "Timer".to_string(),
            zellij_tile::prelude::Event::WebRequestResult(status, ..) => {
                format!("WebRequestResult({status})")
            }
            zellij_tile::prelude::Event::PermissionRequestResult(..) => {
                "PermissionRequestResult".to_string()
            }
            _ => "Other".to_string(),
        }
    }

    /// Maps keyboard events to application events.
    ///
    /// An open dialog takes every key, then an open menu, then search input.
    fn map_key_event(&self, key: &KeyWithModifier) -> Option<Event> {
        tracing::trace!(bare_key = ?key.bare_key, "key event");

        if self.app.dialog != Dialog::None {
            return Some(match key.bare_key {
                BareKey::Esc => Event::DialogCancel,
                BareKey::Enter => Event::DialogSubmit,
                BareKey::Tab => Event::DialogSwitchField,
                BareKey::Backspace => Event::Backspace,
                BareKey::Char(c) => Event::Char(c),
                _ => return None,
            });
        }

        if self.app.menu != MenuState::Closed {
            return Some(match key.bare_key {
                BareKey::Down | BareKey::Char('j') => Event::MenuDown,
                BareKey::Up | BareKey::Char('k') => Event::MenuUp,
                BareKey::Enter => Event::MenuSelect,
                BareKey::Char('s') => Event::ToggleSortMenu,
                BareKey::Esc => Event::Escape,
                _ => return None,
            });
        }

        match self.app.input_mode {
            InputMode::Search(SearchFocus::Typing) => Some(match key.bare_key {
                BareKey::Esc => Event::ExitSearch,
                BareKey::Enter | BareKey::Down => Event::FocusResults,
                BareKey::Backspace => Event::Backspace,
                BareKey::Char(c) => Event::Char(c),
                _ => return None,
            }),
            InputMode::Search(SearchFocus::Navigating) => Some(match key.bare_key {
                BareKey::Esc => Event::ExitSearch,
                BareKey::Char('/') => Event::SearchMode,
                _ => return self.map_browse_key(key),
            }),
            InputMode::Normal => self.map_browse_key(key),
        }
    }

    fn map_browse_key(&self, key: &KeyWithModifier) -> Option<Event> {
        Some(match key.bare_key {
            BareKey::Down | BareKey::Char('j') => Event::KeyDown,
            BareKey::Up | BareKey::Char('k') => Event::KeyUp,
            BareKey::Left | BareKey::Char('h') => Event::PrevPage,
            BareKey::Right | BareKey::Char('l') => Event::NextPage,
            BareKey::Char('g') => Event::GoToPage(1),
            BareKey::Char('G') => Event::GoToPage(self.app.feed.page_count),
            BareKey::Char(c @ '1'..='9') => Event::GoToPage(c.to_digit(10).map_or(1, |d| d as usize)),
            BareKey::Enter => Event::TogglePostMenu,
            BareKey::Char('s') => Event::ToggleSortMenu,
            BareKey::Char('f') => Event::CycleStatusFilter,
            BareKey::Char('/') => Event::SearchMode,
            BareKey::Char('r') => Event::Reload,
            BareKey::Char('x') => Event::MarkResolved,
            BareKey::Char('e') => Event::RequestEdit,
            BareKey::Char('d') => Event::RequestDelete,
            BareKey::Char('q') if self.app.input_mode == InputMode::Normal => Event::CloseFocus,
            BareKey::Esc => Event::Escape,
            _ => return None,
        })
    }

    fn map_mouse_event(&self, mouse: Mouse) -> Option<Event> {
        match mouse {
            Mouse::ScrollUp(_) => Some(Event::Scroll(-1)),
            Mouse::ScrollDown(_) => Some(Event::Scroll(1)),
            Mouse::LeftClick(line, col) if self.app.menu.is_open() => self.map_menu_click(line, col),
            _ => None,
        }
    }

    /// Resolves a click while a menu is open. Zellij reports 0-based cells.
    fn map_menu_click(&self, line: isize, col: usize) -> Option<Event> {
        let Ok(line) = usize::try_from(line) else {
            return Some(Event::OutsideClick);
        };
        let (rows, cols) = self.viewport;
        let vm = self.app.compute_viewmodel(rows, cols, Utc::now());
        match menu_hit(&vm, rows, cols, line + 1, col + 1) {
            MenuHit::Item(index) => Some(Event::MenuPick(index)),
            MenuHit::Frame => None,
            MenuHit::Outside => Some(Event::OutsideClick),
        }
    }

    /// Routes a web reply to the store or the mapping client by its context.
    fn map_web_result(&self, status: u16, body: Vec<u8>, context: &BTreeMap<String, String>) -> Option<Event> {
        let reply = HttpReply { status, body };

        match context.get(CONTEXT_KIND).map(String::as_str) {
            Some(KIND_GATEWAY) => {
                let store = self.store.as_ref()?;
                let request_context = RequestContext::from_map(context)?;
                let _span = tracing::debug_span!(
                    "gateway_reply",
                    request_id = request_context.request_id,
                    op = request_context.op.as_str(),
                    status,
                    issued_in = ?request_context.trace.as_ref().map(|t| t.span_id.as_str())
                )
                .entered();
                Some(Event::GatewayResponse {
                    response: store.interpret(&request_context, &reply),
                    now: Utc::now(),
                })
            }
            Some(KIND_MAP) => MapsClient::interpret(context, &reply).map(Event::MapResponse),
            _ => {
                tracing::debug!(status, "web result without a known context ignored");
                None
            }
        }
    }

    /// Carries out one action; returns an event when it fails synchronously.
    #[tracing::instrument(level = "debug", skip(self))]
    fn execute_action(&self, action: Action) -> Option<Event> {
        match action {
            Action::CloseFocus => {
                hide_self();
                None
            }
            Action::ScheduleTimer { secs } => {
                set_timeout(secs);
                None
            }
            Action::Gateway(request) => self.send_gateway(&request),
            Action::Map(request) => {
                self.send_map(&request);
                None
            }
        }
    }

    fn send_gateway(&self, request: &GatewayRequest) -> Option<Event> {
        let prepared = match &self.store {
            Some(store) => store.prepare(request).map_err(|e| e.to_string()),
            None => Err("no database configured".to_string()),
        };

        match prepared {
            Ok(http) => {
                send(http);
                None
            }
            Err(message) => {
                tracing::error!(request_id = request.request_id(), error = %message, "request not sent");
                let context = request.context();
                Some(Event::GatewayResponse {
                    response: GatewayResponse::Failed {
                        request_id: context.request_id,
                        op: context.op,
                        subscription: context.subscription,
                        message,
                    },
                    now: Utc::now(),
                })
            }
        }
    }

    fn send_map(&self, request: &MapRequest) {
        match self.app.maps.client() {
            Some(client) => send(client.prepare(request)),
            None => tracing::debug!(request = ?request, "map request without a client dropped"),
        }
    }
}

fn send(request: HttpRequest) {
    let verb = match request.method {
        HttpMethod::Get => HttpVerb::Get,
        HttpMethod::Post => HttpVerb::Post,
        HttpMethod::Delete => HttpVerb::Delete,
    };
    web_request(request.url, verb, request.headers, request.body, request.context);
}
