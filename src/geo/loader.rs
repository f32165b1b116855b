//! Process-wide mapping-widget load state.
//!
//! The widget is fetched at most once at a time. Mounts requested while the
//! load is in flight wait in a queue and are released when it completes.

use crate::domain::PostId;
use std::collections::VecDeque;

/// Load status of the mapping widget.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoaderStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed(String),
}

/// What a caller asking for the widget should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDecision {
    /// The widget is available; mount now.
    Ready,
    /// The caller must issue the widget load; the mount has been queued.
    Start,
    /// A load is in flight; the mount has been queued.
    Wait,
}

#[derive(Debug, Default)]
pub struct WidgetLoader {
    status: LoaderStatus,
    pending: VecDeque<PostId>,
}

impl WidgetLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn status(&self) -> &LoaderStatus {
        &self.status
    }

    /// Asks for the widget on behalf of `post_id`.
    ///
    /// A previously failed load is started again.
    pub fn request(&mut self, post_id: &str) -> LoadDecision {
        match self.status {
            LoaderStatus::Loaded => LoadDecision::Ready,
            LoaderStatus::Loading => {
                self.enqueue(post_id);
                LoadDecision::Wait
            }
            LoaderStatus::Unloaded | LoaderStatus::Failed(_) => {
                self.status = LoaderStatus::Loading;
                self.enqueue(post_id);
                LoadDecision::Start
            }
        }
    }

    /// Records the load outcome and drains the queued mounts.
    pub fn complete(&mut self, outcome: Result<(), String>) -> Vec<PostId> {
        self.status = match outcome {
            Ok(()) => LoaderStatus::Loaded,
            Err(message) => LoaderStatus::Failed(message),
        };
        self.pending.drain(..).collect()
    }

    /// Drops a queued mount whose post is no longer visible.
    pub fn forget(&mut self, post_id: &str) {
        self.pending.retain(|id| id != post_id);
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn enqueue(&mut self, post_id: &str) {
        if !self.pending.iter().any(|id| id == post_id) {
            self.pending.push_back(post_id.to_string());
        }
    }
}
