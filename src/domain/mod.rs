//! Domain layer for the moderation console.
//!
//! Contains the post model, its partial updates and the error taxonomy,
//! independent of Zellij APIs and of the remote store's wire format details.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`post`]: Post model, wire record validation and patches
//!
//! # Examples
//!
//! ```
//! use roadguard_moderator::domain::{Post, PostPatch};
//!
//! let mut post = Post::new("p1", "Pothole", "Deep pothole on Main St");
//! PostPatch::Resolve.apply_to(&mut post);
//! assert!(post.resolved);
//! ```

pub mod error;
pub mod post;

pub use error::{ModeratorError, Result, ValidationError};
pub use post::{GeoPoint, Post, PostId, PostPatch};
