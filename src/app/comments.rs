use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::comment::Comment;
use crate::infra::db::Db;

const COMMENT_SELECT: &str = "SELECT cm.id, cm.text, cm.post_id, cm.author_id, \
        u.username AS author_username, cm.created_at \
     FROM comments cm \
     JOIN users u ON u.id = cm.author_id";

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        text: row.get("text"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        created_at: row.get("created_at"),
    }
}

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_comment(&self, author_id: i64, post_id: i64, text: String) -> Result<Comment> {
        let comment_id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (text, post_id, author_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(text)
        .bind(post_id)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        self.find_comment(comment_id)
            .await?
            .ok_or_else(|| anyhow!("comment {} missing right after insert", comment_id))
    }

    pub async fn find_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let sql = format!("{} WHERE cm.id = $1", COMMENT_SELECT);
        let row = sqlx::query(&sql)
            .bind(comment_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    /// All comments of a post, oldest first.
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "{} WHERE cm.post_id = $1 ORDER BY cm.created_at ASC, cm.id ASC",
            COMMENT_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(post_id)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    /// Rewrites the text of a comment owned by `author_id` under `post_id`.
    pub async fn update_comment(
        &self,
        comment_id: i64,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Option<Comment>> {
        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE comments SET text = $4 \
             WHERE id = $1 AND post_id = $2 AND author_id = $3 \
             RETURNING id",
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .fetch_optional(self.db.pool())
        .await?;

        match updated {
            Some(comment_id) => self.find_comment(comment_id).await,
            None => Ok(None),
        }
    }

    pub async fn delete_comment(&self, comment_id: i64, post_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM comments WHERE id = $1 AND post_id = $2 AND author_id = $3",
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(author_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
