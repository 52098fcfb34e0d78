//! Authorization decisions for post and comment mutations.
//!
//! A denial never says "forbidden": callers answer it exactly like a missing
//! resource, so restricted posts and comments do not leak their existence.

use crate::domain::comment::Comment;

/// The authenticated caller of a mutating request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: i64,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Send the caller back to the post's detail page.
    RedirectToPost,
    NotFound,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Only the author edits a post; everyone else goes back to the post.
pub fn post_edit(author_id: i64, requester: Option<Requester>) -> Decision {
    match requester {
        Some(requester) if requester.user_id == author_id => Decision::Allow,
        _ => Decision::RedirectToPost,
    }
}

/// The author or a staff member deletes a post.
pub fn post_delete(author_id: i64, requester: Option<Requester>) -> Decision {
    match requester {
        None => Decision::RedirectToPost,
        Some(requester) if requester.user_id == author_id || requester.is_staff => Decision::Allow,
        Some(_) => Decision::NotFound,
    }
}

/// A comment is editable by its author, and only under its own post.
pub fn comment_modify(comment: &Comment, path_post_id: i64, requester: Requester) -> Decision {
    if comment.author_id == requester.user_id && comment.post_id == path_post_id {
        Decision::Allow
    } else {
        Decision::NotFound
    }
}
