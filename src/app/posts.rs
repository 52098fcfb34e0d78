use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;

use crate::app::visibility::{self, Publication};
use crate::domain::post::{CategoryRef, LocationRef, Post, PostDraft};
use crate::infra::db::Db;

/// Post columns with author, category, location and comment count joined in.
/// `posts` is `p` and `categories` is `c`, as `visibility::public_clause` expects.
pub(crate) const POST_SELECT: &str = "SELECT p.id, p.title, p.text, p.pub_date, p.author_id, \
        u.username AS author_username, p.is_published, p.image_key, p.created_at, \
        c.id AS category_id, c.title AS category_title, c.slug AS category_slug, \
        c.is_published AS category_is_published, \
        l.id AS location_id, l.name AS location_name, l.is_published AS location_is_published, \
        (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN categories c ON c.id = p.category_id \
     LEFT JOIN locations l ON l.id = p.location_id";

pub(crate) fn post_from_row(row: &PgRow) -> Post {
    let category_id: Option<i64> = row.get("category_id");
    let category = category_id.map(|id| CategoryRef {
        id,
        title: row.get("category_title"),
        slug: row.get("category_slug"),
        is_published: row.get("category_is_published"),
    });

    let location_id: Option<i64> = row.get("location_id");
    let location = location_id.map(|id| LocationRef {
        id,
        name: row.get("location_name"),
        is_published: row.get("location_is_published"),
    });

    Post {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        pub_date: row.get("pub_date"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        category,
        location,
        is_published: row.get("is_published"),
        image: row.get("image_key"),
        image_url: None,
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
    }
}

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(&self, author_id: i64, draft: PostDraft) -> Result<Post> {
        let post_id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, text, pub_date, author_id, location_id, category_id, is_published, image_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id",
        )
        .bind(draft.title)
        .bind(draft.text)
        .bind(draft.pub_date)
        .bind(author_id)
        .bind(draft.location_id)
        .bind(draft.category_id)
        .bind(draft.is_published)
        .bind(draft.image_key)
        .fetch_one(self.db.pool())
        .await?;

        self.find_post(post_id)
            .await?
            .ok_or_else(|| anyhow!("post {} missing right after insert", post_id))
    }

    /// Looks a post up with no visibility filtering.
    pub async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let sql = format!("{} WHERE p.id = $1", POST_SELECT);
        let row = sqlx::query(&sql)
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// Looks a post up as `viewer_id` would see it; hidden posts read as absent.
    pub async fn find_visible_post(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
        now: OffsetDateTime,
    ) -> Result<Option<Post>> {
        let post = self.find_post(post_id).await?;
        Ok(post.filter(|post| visibility::is_visible_to(&Publication::from(post), viewer_id, now)))
    }

    /// Replaces every editable field of the post.
    pub async fn update_post(&self, post_id: i64, draft: PostDraft) -> Result<Option<Post>> {
        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE posts \
             SET title = $2, text = $3, pub_date = $4, location_id = $5, category_id = $6, \
                 is_published = $7, image_key = $8 \
             WHERE id = $1 \
             RETURNING id",
        )
        .bind(post_id)
        .bind(draft.title)
        .bind(draft.text)
        .bind(draft.pub_date)
        .bind(draft.location_id)
        .bind(draft.category_id)
        .bind(draft.is_published)
        .bind(draft.image_key)
        .fetch_optional(self.db.pool())
        .await?;

        match updated {
            Some(post_id) => self.find_post(post_id).await,
            None => Ok(None),
        }
    }

    /// Deletes the post and, through the foreign key, its comments.
    pub async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
