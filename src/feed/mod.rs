//! Pagination, sorting and filtering of the working set.
//!
//! Everything in this module is a pure function of its inputs: deriving the
//! visible slice never touches the remote store.
//!
//! ```text
//! working set ─▶ filter ─▶ sort (stable) ─▶ window(page, page_size) ─▶ visible slice
//! ```

pub mod filter;
pub mod paging;
pub mod sort;

pub use filter::{FeedFilter, StatusFilter};
pub use paging::{clamp_page, page_count, paginate, FeedPage, DEFAULT_PAGE_SIZE};
pub use sort::{sort_posts, SortOption};
