//! Who may see which post.
//!
//! A post is public when it is published, its publication date has passed and
//! it sits in a published category. A post without a category is never
//! public. Authors always see their own posts.
//!
//! [`is_visible_to`] is the in-memory check used for single-post lookups;
//! [`public_clause`] is the same predicate for list queries, so the two never
//! disagree.

use time::OffsetDateTime;

use crate::domain::post::Post;

/// The fields of a post that decide its visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Publication {
    pub author_id: i64,
    pub is_published: bool,
    pub pub_date: OffsetDateTime,
    /// `None` when the post has no category.
    pub category_published: Option<bool>,
}

impl From<&Post> for Publication {
    fn from(post: &Post) -> Self {
        Self {
            author_id: post.author_id,
            is_published: post.is_published,
            pub_date: post.pub_date,
            category_published: post.category.as_ref().map(|category| category.is_published),
        }
    }
}

pub fn is_publicly_visible(publication: &Publication, now: OffsetDateTime) -> bool {
    publication.is_published
        && publication.pub_date <= now
        && publication.category_published == Some(true)
}

pub fn is_visible_to(publication: &Publication, viewer_id: Option<i64>, now: OffsetDateTime) -> bool {
    viewer_id == Some(publication.author_id) || is_publicly_visible(publication, now)
}

/// SQL rendition of [`is_publicly_visible`].
///
/// Expects `posts` aliased as `p` and `categories` LEFT JOINed as `c`; a
/// missing category makes `c.is_published` NULL, which filters the row out.
/// `now_param` is the placeholder index the current instant is bound to.
pub fn public_clause(now_param: usize) -> String {
    format!(
        "(p.is_published = TRUE AND p.pub_date <= ${} AND c.is_published = TRUE)",
        now_param
    )
}
