//! Error types for the moderation console.
//!
//! [`ModeratorError`] mirrors the failure taxonomy of the feed: reads, local
//! validation, remote writes and reverse geocoding, plus the ambient failures
//! of configuration, theming and I/O. None of them is fatal to the plugin;
//! callers convert them into view state where the external call completes.

use thiserror::Error;

/// The main error type for moderation console operations.
///
/// # Examples
///
/// ```
/// use roadguard_moderator::domain::{ModeratorError, ValidationError};
///
/// let err = ModeratorError::from(ValidationError::EmptyReason);
/// assert_eq!(err.to_string(), "Validation error: a reason is required to delete a post");
/// ```
#[derive(Debug, Error)]
pub enum ModeratorError {
    /// The bulk read of a collection failed.
    ///
    /// The working set is left as it was and the loading flag clears.
    #[error("Could not read {what}: {message}")]
    Read { what: &'static str, message: String },

    /// Local input failed a client-side check.
    ///
    /// No remote call is attempted when this is produced.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A remote mutation was rejected or the transport failed.
    ///
    /// `action` names the attempted change, e.g. `"delete post"`.
    #[error("Could not {action}: {message}")]
    Write { action: &'static str, message: String },

    /// Reverse geocoding did not produce an address.
    #[error("Geocode error: {0}")]
    Geocode(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Theme parsing or application failed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Client-side validation failures.
///
/// Rendered inline next to the input that caused them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("description must not be empty")]
    EmptyBody,

    #[error("a reason is required to delete a post")]
    EmptyReason,

    /// A backend record lacks a field the feed cannot do without.
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),

    /// A backend record carries a field with an unusable value.
    #[error("field `{field}` is invalid: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// A specialized `Result` type for moderation console operations.
pub type Result<T> = std::result::Result<T, ModeratorError>;
