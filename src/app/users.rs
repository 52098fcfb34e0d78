use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::user::User;
use crate::infra::db::Db;

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, is_staff, created_at";

pub(crate) fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_staff: row.get("is_staff"),
        created_at: row.get("created_at"),
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn is_staff(&self, user_id: i64) -> Result<bool> {
        let is_staff: Option<bool> = sqlx::query_scalar("SELECT is_staff FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(is_staff.unwrap_or(false))
    }

    pub async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users \
             SET username = $2, first_name = $3, last_name = $4, email = $5 \
             WHERE id = $1 \
             RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(update.username)
            .bind(update.first_name)
            .bind(update.last_name)
            .bind(update.email)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn set_staff(&self, username: &str, is_staff: bool) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET is_staff = $2 WHERE username = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(username)
            .bind(is_staff)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}
