//! Search and status filtering applied before sorting.
//!
//! Search uses the Skim fuzzy matcher: the query is split on whitespace and
//! every token must match somewhere in the post's title, body or author.

use crate::domain::Post;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Which posts to show by resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Resolved,
}

impl StatusFilter {
    /// The next filter in the `f` key cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::All => Self::Open,
            Self::Open => Self::Resolved,
            Self::Resolved => Self::All,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Open => "Open",
            Self::Resolved => "Resolved",
        }
    }

    const fn admits(self, post: &Post) -> bool {
        match self {
            Self::All => true,
            Self::Open => !post.resolved,
            Self::Resolved => post.resolved,
        }
    }
}

/// The active search query and status filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub query: String,
    pub status: StatusFilter,
}

impl FeedFilter {
    /// Returns `true` when nothing would be filtered out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.status == StatusFilter::All
    }

    /// Returns the posts admitted by the filter, preserving their order.
    ///
    /// ```
    /// use roadguard_moderator::domain::Post;
    /// use roadguard_moderator::feed::{FeedFilter, StatusFilter};
    ///
    /// let posts = vec![Post::new("1", "Pothole", "Main St"), Post::new("2", "Flood", "River Rd")];
    /// let filter = FeedFilter { query: "pthl".into(), status: StatusFilter::All };
    /// assert_eq!(filter.apply(&posts).len(), 1);
    /// ```
    #[must_use]
    pub fn apply(&self, posts: &[Post]) -> Vec<Post> {
        let tokens = self.tokens();
        let matcher = if tokens.is_empty() {
            None
        } else {
            Some(SkimMatcherV2::default())
        };

        let filtered: Vec<Post> = posts
            .iter()
            .filter(|post| self.status.admits(post))
            .filter(|post| {
                matcher.as_ref().map_or(true, |m| {
                    let haystack =
                        format!("{} {} {}", post.title, post.body, post.author).to_lowercase();
                    tokens.iter().all(|token| m.fuzzy_match(&haystack, token).is_some())
                })
            })
            .cloned()
            .collect();

        tracing::trace!(
            total = posts.len(),
            filtered = filtered.len(),
            status = ?self.status,
            "feed filter applied"
        );

        filtered
    }

    /// Character ranges of `text` matched by the query, for highlighting.
    ///
    /// Consecutive matched indices are coalesced into `(start, end)` ranges
    /// with an exclusive end.
    #[must_use]
    pub fn highlight_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        let query = self.query.trim();
        if query.is_empty() {
            return vec![];
        }

        let matcher = SkimMatcherV2::default();
        let Some((_score, indices)) = matcher.fuzzy_indices(text, query) else {
            return vec![];
        };

        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for idx in indices {
            match ranges.last_mut() {
                Some((_, end)) if *end == idx => *end = idx + 1,
                _ => ranges.push((idx, idx + 1)),
            }
        }
        ranges
    }

    fn tokens(&self) -> Vec<String> {
        self.query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }
}
