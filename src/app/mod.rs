//! Application layer: the feed view-model and its event loop.
//!
//! ```text
//! Zellij input / timers / web results → Event → handle_event → AppState
//!                                                     ↓
//!                                  Action (gateway, map, timer) → runtime
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effects executed by the plugin runtime
//! - [`handler`]: Event processing and state transitions
//! - [`moderation`]: Delete, resolve and edit with confirm-then-patch semantics
//! - [`modes`]: Input modes, menus and dialogs
//! - [`state`]: Central state container and view model computation

pub mod actions;
pub mod handler;
pub mod moderation;
pub mod modes;
pub mod state;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use modes::{Dialog, EditField, InputMode, MenuState, MenuTarget, PostMenuItem, SearchFocus};
pub use state::{AppState, FeedSettings, PendingOp};
