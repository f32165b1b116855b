//! Side effects requested by the event handler.
//!
//! The handler never performs I/O. It returns [`Action`]s that the plugin
//! runtime executes after the event has been applied to the state.

use crate::gateway::GatewayRequest;
use crate::geo::MapRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Hides the plugin pane.
    CloseFocus,

    /// Sends a request to the remote store.
    Gateway(GatewayRequest),

    /// Sends a request to the mapping service.
    Map(MapRequest),

    /// Arms a one-shot runtime timer.
    ScheduleTimer {
        /// Seconds from now.
        secs: f64,
    },
}
