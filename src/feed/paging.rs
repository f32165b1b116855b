//! Pagination over the sorted working set.

use super::sort::{sort_posts, SortOption};
use crate::domain::Post;
use std::ops::Range;

/// Page size used when the configuration does not set one.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Result of sorting and windowing the working set.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    /// The full working set in sort order.
    pub sorted: Vec<Post>,
    /// Indices into `sorted` visible on this page.
    pub window: Range<usize>,
    /// 1-based page number after clamping.
    pub page: usize,
    /// Number of pages; zero when there are no posts.
    pub page_count: usize,
}

impl FeedPage {
    /// The posts shown on this page.
    #[must_use]
    pub fn visible(&self) -> &[Post] {
        &self.sorted[self.window.clone()]
    }
}

/// Number of pages needed for `total` items.
#[must_use]
pub const fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Clamps a requested page into `[1, max(page_count, 1)]`.
#[must_use]
pub fn clamp_page(page: usize, page_count: usize) -> usize {
    page.clamp(1, page_count.max(1))
}

/// Sorts `posts` and cuts out the window for `page`.
///
/// Pages outside the valid range are clamped rather than producing an empty
/// window, so a deletion on the last page lands the user on the new last page.
///
/// ```
/// use roadguard_moderator::domain::Post;
/// use roadguard_moderator::feed::{paginate, SortOption};
///
/// let posts: Vec<Post> = (0..7).map(|i| Post::new(i.to_string(), "t", "b")).collect();
/// let page = paginate(&posts, SortOption::MostVoted, 2, 5);
/// assert_eq!(page.page_count, 2);
/// assert_eq!(page.visible().len(), 2);
/// ```
#[must_use]
pub fn paginate(posts: &[Post], option: SortOption, page: usize, page_size: usize) -> FeedPage {
    let page_size = page_size.max(1);
    let sorted = sort_posts(posts, option);
    let page_count = page_count(sorted.len(), page_size);
    let page = clamp_page(page, page_count);

    let start = ((page - 1) * page_size).min(sorted.len());
    let end = (start + page_size).min(sorted.len());

    FeedPage {
        sorted,
        window: start..end,
        page,
        page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn posts(n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| {
                let mut p = Post::new(format!("p{i}"), "t", "b");
                p.upvotes = i64::try_from(i % 4).unwrap();
                p
            })
            .collect()
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 5), 0);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(6, 5), 2);
        assert_eq!(page_count(3, 0), 0);
    }

    #[test]
    fn union_of_pages_is_the_sorted_set() {
        for total in [0, 1, 4, 5, 6, 13, 20] {
            let working = posts(total);
            for option in SortOption::ALL {
                let first = paginate(&working, option, 1, 5);
                let mut seen = Vec::new();
                for p in 1..=first.page_count {
                    let page = paginate(&working, option, p, 5);
                    assert!(page.visible().len() <= 5);
                    seen.extend(page.visible().iter().map(|post| post.id.clone()));
                }
                let expected: Vec<_> = first.sorted.iter().map(|post| post.id.clone()).collect();
                assert_eq!(seen, expected);
                assert_eq!(seen.iter().collect::<HashSet<_>>().len(), total);
            }
        }
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        let working = posts(7);
        let high = paginate(&working, SortOption::MostRecent, 9, 5);
        assert_eq!(high.page, 2);
        assert_eq!(high.visible().len(), 2);

        let zero = paginate(&working, SortOption::MostRecent, 0, 5);
        assert_eq!(zero.page, 1);
        assert_eq!(zero.visible().len(), 5);
    }

    #[test]
    fn empty_working_set_has_empty_window() {
        let page = paginate(&[], SortOption::MostVoted, 3, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_count, 0);
        assert!(page.visible().is_empty());
    }
}
