//! User interface rendering layer with component-based architecture.
//!
//! ```text
//! AppState → compute_viewmodel → UIViewModel → render → ANSI Output
//! ```
//!
//! # Modules
//!
//! - [`viewmodel`]: Display-ready view model types
//! - [`renderer`]: Top-level rendering coordinator
//! - [`components`]: Header, cards, overlays and footer renderers
//! - [`helpers`]: Character-aware clipping, padding and highlighting
//! - [`theme`]: Color schemes and ANSI escape sequences

pub mod components;
pub mod helpers;
pub mod renderer;
pub mod theme;
pub mod viewmodel;

pub use components::{menu_hit, MenuHit};
pub use renderer::render;
pub use theme::Theme;
pub use viewmodel::{
    Banner, BannerKind, DialogView, EmptyState, FooterInfo, HeaderInfo, MenuItemView, MenuOverlay,
    PaginationInfo, PostCard, SearchBarInfo, UIViewModel,
};
