//! Top-level rendering coordinator.
//!
//! Rendering is two steps: compute a [`UIViewModel`] from the state, then
//! hand it to the components. Nothing here reads the domain types.

use crate::app::AppState;
use crate::ui::components;
use crate::ui::viewmodel::UIViewModel;
use crate::ui::theme::Theme;
use chrono::Utc;

/// Renders the plugin UI to stdout.
///
/// Does not clear the screen; Zellij hands the plugin a fresh frame on
/// every render.
pub fn render(state: &AppState, rows: usize, cols: usize) {
    let viewmodel = state.compute_viewmodel(rows, cols, Utc::now());

    render_viewmodel(&viewmodel, &state.theme, rows, cols);
}

fn render_viewmodel(vm: &UIViewModel, theme: &Theme, rows: usize, cols: usize) {
    let _span = tracing::trace_span!("render", rows, cols, cards = vm.cards.len()).entered();
    components::render_layout(vm, theme, cols, rows);
}
