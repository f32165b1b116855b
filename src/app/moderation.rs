//! Moderation actions: delete, resolve and edit.
//!
//! Every action validates locally first; an invalid request never reaches
//! the remote store. The local working set is only changed once the store
//! confirms the write, so a failed write leaves the feed exactly as it was.

use super::actions::Action;
use super::modes::{Dialog, EditField};
use super::state::{AppState, PendingOp};
use crate::domain::post::DEFAULT_BODY_KEY;
use crate::domain::{ModeratorError, PostPatch, ValidationError};
use crate::gateway::{GatewayRequest, RequestId};
use chrono::{DateTime, Utc};

impl AppState {
    /// Opens the delete confirmation for `post_id`.
    pub fn open_delete_dialog(&mut self, post_id: &str) -> bool {
        if self.find_post(post_id).is_none() {
            return false;
        }
        self.dialog = Dialog::ConfirmDelete {
            post_id: post_id.to_string(),
            reason: String::new(),
            error: None,
            submitting: false,
        };
        true
    }

    /// Opens the editor for `post_id`, prefilled with its current text.
    pub fn open_edit_dialog(&mut self, post_id: &str) -> bool {
        let Some(post) = self.find_post(post_id) else {
            return false;
        };
        self.dialog = Dialog::Edit {
            post_id: post.id.clone(),
            title: post.title.clone(),
            body: post.body.clone(),
            field: EditField::Title,
            error: None,
            submitting: false,
        };
        true
    }

    /// Issues the removal of a post.
    ///
    /// The reason is required but stays local: it is written to the trace
    /// log with the post id when the removal is confirmed.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyReason`] when `reason` is blank.
    pub fn delete_post(&mut self, post_id: &str, reason: &str) -> Result<Action, ValidationError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::EmptyReason);
        }

        let request_id = self.next_request_id();
        self.pending.insert(
            request_id,
            PendingOp::Delete {
                post_id: post_id.to_string(),
                reason: reason.to_string(),
            },
        );
        tracing::info!(request_id, post_id = %post_id, "delete requested");

        Ok(Action::Gateway(GatewayRequest::Remove {
            request_id,
            path: self.post_path(post_id),
        }))
    }

    /// Issues `{resolved: true}` for a post.
    ///
    /// Repeated calls each issue their own write.
    pub fn mark_resolved(&mut self, post_id: &str) -> Option<Action> {
        self.find_post(post_id)?;
        Some(self.issue_patch(post_id, PostPatch::Resolve))
    }

    /// Issues an update of exactly the title and body of a post.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyTitle`] or [`ValidationError::EmptyBody`] when
    /// either is blank after trimming.
    pub fn edit_post(&mut self, post_id: &str, title: &str, body: &str) -> Result<Action, ValidationError> {
        let title = title.trim();
        let body = body.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if body.is_empty() {
            return Err(ValidationError::EmptyBody);
        }

        let body_key = self.find_post(post_id).map_or(DEFAULT_BODY_KEY, |post| post.body_key);
        Ok(self.issue_patch(
            post_id,
            PostPatch::Content {
                title: title.to_string(),
                body: body.to_string(),
                body_key,
            },
        ))
    }

    /// Submits the open delete or edit dialog.
    ///
    /// Validation failures are shown inline and produce no action.
    pub fn submit_dialog(&mut self) -> Option<Action> {
        let result = match self.dialog.clone() {
            Dialog::None
            | Dialog::ConfirmDelete { submitting: true, .. }
            | Dialog::Edit { submitting: true, .. } => return None,
            Dialog::ConfirmDelete { post_id, reason, .. } => self.delete_post(&post_id, &reason),
            Dialog::Edit {
                post_id, title, body, ..
            } => self.edit_post(&post_id, &title, &body),
        };

        match result {
            Ok(action) => {
                self.set_dialog_state(None, true);
                Some(action)
            }
            Err(e) => {
                tracing::debug!(error = %e, "dialog input rejected");
                self.set_dialog_state(Some(e.to_string()), false);
                None
            }
        }
    }

    /// Applies the outcome of a delete or patch once the store has answered.
    ///
    /// Returns map requests produced by the view refresh.
    pub fn complete_write(
        &mut self,
        request_id: RequestId,
        outcome: Result<(), String>,
        now: DateTime<Utc>,
    ) -> Vec<Action> {
        let Some(op) = self.pending.remove(&request_id) else {
            tracing::debug!(request_id, "response for unknown write ignored");
            return vec![];
        };

        match (op, outcome) {
            (PendingOp::Delete { post_id, reason }, Ok(())) => {
                let before = self.posts.len();
                self.posts.retain(|p| p.id != post_id);
                tracing::info!(
                    post_id = %post_id,
                    reason = %reason,
                    removed = before - self.posts.len(),
                    "post deleted"
                );
                if matches!(&self.dialog, Dialog::ConfirmDelete { post_id: id, .. } if *id == post_id) {
                    self.dialog = Dialog::None;
                }
                self.error_banner = None;
                self.set_flash("Post deleted", now);
                self.refresh_view()
            }
            (PendingOp::Delete { post_id, .. }, Err(message)) => {
                let failure = ModeratorError::Write {
                    action: "delete post",
                    message,
                };
                tracing::error!(post_id = %post_id, error = %failure, "delete failed");
                if let Dialog::ConfirmDelete {
                    post_id: id,
                    error,
                    submitting,
                    ..
                } = &mut self.dialog
                {
                    if *id == post_id {
                        *error = Some(failure.to_string());
                        *submitting = false;
                    }
                }
                self.error_banner = Some(failure.to_string());
                vec![]
            }
            (PendingOp::Patch { post_id, patch }, Ok(())) => {
                if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
                    patch.apply_to(post);
                }
                tracing::info!(post_id = %post_id, patch = ?patch, "post updated");
                self.error_banner = None;

                if let PostPatch::Content { .. } = patch {
                    if matches!(&self.dialog, Dialog::Edit { post_id: id, .. } if *id == post_id) {
                        self.dialog = Dialog::None;
                    }
                    self.set_flash("Post updated", now);
                    self.selected_index = 0;
                }
                self.refresh_view()
            }
            (PendingOp::Patch { post_id, patch }, Err(message)) => {
                let action = match patch {
                    PostPatch::Resolve => "resolve post",
                    PostPatch::Content { .. } => "update post",
                };
                let failure = ModeratorError::Write { action, message };
                tracing::error!(post_id = %post_id, error = %failure, "update failed");
                match patch {
                    PostPatch::Resolve => {
                        self.error_banner = Some(failure.to_string());
                    }
                    PostPatch::Content { .. } => {
                        if let Dialog::Edit {
                            post_id: id,
                            error,
                            submitting,
                            ..
                        } = &mut self.dialog
                        {
                            if *id == post_id {
                                *error = Some(failure.to_string());
                                *submitting = false;
                            }
                        }
                    }
                }
                vec![]
            }
            (PendingOp::LoadPosts, _) => {
                tracing::warn!(request_id, "read registered as a write");
                vec![]
            }
        }
    }

    fn issue_patch(&mut self, post_id: &str, patch: PostPatch) -> Action {
        let request_id = self.next_request_id();
        let fields = patch.fields();
        self.pending.insert(
            request_id,
            PendingOp::Patch {
                post_id: post_id.to_string(),
                patch,
            },
        );
        tracing::info!(request_id, post_id = %post_id, "update requested");

        Action::Gateway(GatewayRequest::Write {
            request_id,
            path: self.post_path(post_id),
            fields,
        })
    }

    fn set_dialog_state(&mut self, message: Option<String>, now_submitting: bool) {
        match &mut self.dialog {
            Dialog::ConfirmDelete {
                error, submitting, ..
            }
            | Dialog::Edit {
                error, submitting, ..
            } => {
                *error = message;
                *submitting = now_submitting;
            }
            Dialog::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::FeedSettings;
    use crate::domain::Post;
    use crate::geo::MapAdapter;
    use crate::ui::Theme;

    fn state() -> AppState {
        let mut state = AppState::new(FeedSettings::default(), Theme::default(), MapAdapter::new(None));
        state.mounted = true;
        state.posts = vec![Post::new("a", "Pothole", "Main St"), Post::new("b", "Flood", "River Rd")];
        state.refresh_view();
        state
    }

    fn request_id(action: &Action) -> RequestId {
        match action {
            Action::Gateway(request) => request.request_id(),
            other => panic!("not a gateway action: {other:?}"),
        }
    }

    #[test]
    fn blank_reason_is_rejected_without_request() {
        let mut state = state();
        assert_eq!(state.delete_post("a", "   "), Err(ValidationError::EmptyReason));
        assert!(state.pending.is_empty());
    }

    #[test]
    fn delete_removes_only_after_success() {
        let mut state = state();
        let action = state.delete_post("a", "spam").unwrap();
        assert_eq!(
            action,
            Action::Gateway(GatewayRequest::Remove { request_id: 1, path: "posts/a".into() })
        );
        assert_eq!(state.posts.len(), 2);

        state.complete_write(request_id(&action), Ok(()), Utc::now());
        let ids: Vec<_> = state.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn failed_delete_keeps_post_and_reports() {
        let mut state = state();
        state.open_delete_dialog("a");
        if let Dialog::ConfirmDelete { reason, .. } = &mut state.dialog {
            reason.push_str("duplicate");
        }
        let action = state.submit_dialog().unwrap();
        state.complete_write(request_id(&action), Err("Permission denied".into()), Utc::now());

        assert_eq!(state.posts.len(), 2);
        assert!(state.error_banner.as_deref().unwrap().contains("Permission denied"));
        assert!(matches!(
            &state.dialog,
            Dialog::ConfirmDelete { error: Some(_), submitting: false, .. }
        ));
    }

    #[test]
    fn resolve_twice_issues_two_writes() {
        let mut state = state();
        let first = state.mark_resolved("b").unwrap();
        let second = state.mark_resolved("b").unwrap();
        assert_ne!(request_id(&first), request_id(&second));

        state.complete_write(request_id(&first), Ok(()), Utc::now());
        state.complete_write(request_id(&second), Ok(()), Utc::now());

        let post = state.find_post("b").unwrap();
        assert!(post.resolved);
        assert_eq!(post.title, "Flood");
    }

    #[test]
    fn edit_with_blank_title_is_inline_error() {
        let mut state = state();
        state.open_edit_dialog("a");
        if let Dialog::Edit { title, .. } = &mut state.dialog {
            title.clear();
        }
        assert!(state.submit_dialog().is_none());
        assert!(matches!(
            &state.dialog,
            Dialog::Edit { error: Some(e), .. } if e == "title must not be empty"
        ));
        assert_eq!(state.find_post("a").unwrap().title, "Pothole");
    }

    #[test]
    fn edit_success_patches_text_and_flashes() {
        let mut state = state();
        state.selected_index = 1;
        let action = state.edit_post("a", " Deep pothole ", "Main St & 3rd").unwrap();
        match &action {
            Action::Gateway(GatewayRequest::Write { fields, .. }) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields["title"], "Deep pothole");
                assert_eq!(fields["description"], "Main St & 3rd");
            }
            other => panic!("unexpected {other:?}"),
        }

        state.complete_write(request_id(&action), Ok(()), Utc::now());
        assert_eq!(state.find_post("a").unwrap().title, "Deep pothole");
        assert_eq!(state.flash.as_ref().unwrap().message, "Post updated");
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn failed_resolve_leaves_post_open_and_shows_banner() {
        let mut state = state();
        let action = state.mark_resolved("b").unwrap();
        state.complete_write(request_id(&action), Err("HTTP 500".into()), Utc::now());

        assert!(!state.find_post("b").unwrap().resolved);
        assert_eq!(state.error_banner.as_deref(), Some("Could not resolve post: HTTP 500"));
        assert!(state.pending.is_empty());
        assert!(state.flash.is_none());
    }

    #[test]
    fn edit_keeps_the_body_field_of_the_record() {
        let mut state = state();
        let record = serde_json::json!({ "title": "Crack", "content": "Bridge deck" });
        state.posts.push(Post::from_record("c", &record).unwrap());

        let action = state.edit_post("c", "Crack", "Bridge deck, east side").unwrap();
        let Action::Gateway(GatewayRequest::Write { fields, .. }) = &action else {
            panic!("unexpected {action:?}");
        };
        assert_eq!(fields["content"], "Bridge deck, east side");
        assert!(!fields.contains_key("description"));
    }

    #[test]
    fn failed_edit_reports_inside_the_dialog() {
        let mut state = state();
        state.open_edit_dialog("a");
        let action = state.submit_dialog().unwrap();
        state.complete_write(request_id(&action), Err("Permission denied".into()), Utc::now());

        assert!(matches!(
            &state.dialog,
            Dialog::Edit { error: Some(e), submitting: false, .. }
                if e == "Could not update post: Permission denied"
        ));
        assert!(state.error_banner.is_none());
    }
}
