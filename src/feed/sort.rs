//! Sort options for the feed.
//!
//! Sorting is a pure derivation: it never mutates the working set and is not
//! persisted. All comparators are applied with a stable sort so that posts
//! with equal keys keep their fetch order.

use crate::domain::Post;
use std::cmp::Ordering;

/// Orderings offered by the sort menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    /// Newest first, by creation timestamp.
    #[default]
    MostRecent,
    /// Highest net score (upvotes minus downvotes) first.
    MostVoted,
    /// Lowest net score first.
    LeastVoted,
}

impl SortOption {
    /// Every option, in sort-menu order.
    pub const ALL: [Self; 3] = [Self::MostRecent, Self::MostVoted, Self::LeastVoted];

    /// Label shown in the header and the sort menu.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MostRecent => "Most Recent",
            Self::MostVoted => "Most Voted",
            Self::LeastVoted => "Least Voted",
        }
    }

    /// Compares two posts under this option.
    #[must_use]
    pub fn compare(self, a: &Post, b: &Post) -> Ordering {
        match self {
            Self::MostRecent => b.created_at.cmp(&a.created_at),
            Self::MostVoted => b.score().cmp(&a.score()),
            Self::LeastVoted => a.score().cmp(&b.score()),
        }
    }
}

/// Returns the posts ordered by `option`, leaving the input untouched.
///
/// ```
/// use roadguard_moderator::domain::Post;
/// use roadguard_moderator::feed::{sort_posts, SortOption};
///
/// let mut a = Post::new("a", "A", "");
/// a.upvotes = 5;
/// a.downvotes = 1;
/// let mut b = Post::new("b", "B", "");
/// b.upvotes = 2;
///
/// let sorted = sort_posts(&[a, b], SortOption::MostVoted);
/// assert_eq!(sorted[0].id, "a");
/// ```
#[must_use]
pub fn sort_posts(posts: &[Post], option: SortOption) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by(|a, b| option.compare(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn post(id: &str, up: i64, down: i64, minutes: i64) -> Post {
        let mut p = Post::new(id, id, "");
        p.upvotes = up;
        p.downvotes = down;
        p.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        p
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn example_scenario() {
        let posts = vec![post("A", 5, 1, 0), post("B", 2, 0, 10)];
        assert_eq!(ids(&sort_posts(&posts, SortOption::MostVoted)), vec!["A", "B"]);
        assert_eq!(ids(&sort_posts(&posts, SortOption::MostRecent)), vec!["B", "A"]);
        assert_eq!(ids(&sort_posts(&posts, SortOption::LeastVoted)), vec!["B", "A"]);
    }

    #[test]
    fn equal_scores_keep_fetch_order() {
        let posts = vec![
            post("a", 3, 1, 5),
            post("b", 2, 0, 1),
            post("c", 9, 0, 3),
            post("d", 4, 2, 2),
        ];
        assert_eq!(ids(&sort_posts(&posts, SortOption::MostVoted)), vec!["c", "a", "b", "d"]);
        assert_eq!(ids(&sort_posts(&posts, SortOption::LeastVoted)), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn equal_timestamps_keep_fetch_order() {
        let posts = vec![post("x", 0, 0, 7), post("y", 0, 0, 7), post("z", 0, 0, 9)];
        assert_eq!(ids(&sort_posts(&posts, SortOption::MostRecent)), vec!["z", "x", "y"]);
    }
}
