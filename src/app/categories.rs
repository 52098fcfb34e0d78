use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::category::{Category, CategoryDraft, Location};
use crate::infra::db::Db;

fn category_from_row(row: &PgRow) -> Category {
    Category {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        slug: row.get("slug"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}

fn location_from_row(row: &PgRow) -> Location {
    Location {
        id: row.get("id"),
        name: row.get("name"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}

#[derive(Clone)]
pub struct CategoryService {
    db: Db,
}

impl CategoryService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Unpublished categories read as absent.
    pub async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT id, title, description, slug, is_published, created_at \
             FROM categories WHERE slug = $1 AND is_published = TRUE",
        )
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(category_from_row))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, title, description, slug, is_published, created_at \
             FROM categories ORDER BY title ASC, id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(category_from_row).collect())
    }

    pub async fn create_category(&self, draft: CategoryDraft) -> Result<Category> {
        let row = sqlx::query(
            "INSERT INTO categories (title, description, slug, is_published) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, title, description, slug, is_published, created_at",
        )
        .bind(draft.title)
        .bind(draft.description)
        .bind(draft.slug)
        .bind(draft.is_published)
        .fetch_one(self.db.pool())
        .await?;

        Ok(category_from_row(&row))
    }

    pub async fn update_category(&self, category_id: i64, draft: CategoryDraft) -> Result<Option<Category>> {
        let row = sqlx::query(
            "UPDATE categories \
             SET title = $2, description = $3, slug = $4, is_published = $5 \
             WHERE id = $1 \
             RETURNING id, title, description, slug, is_published, created_at",
        )
        .bind(category_id)
        .bind(draft.title)
        .bind(draft.description)
        .bind(draft.slug)
        .bind(draft.is_published)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(category_from_row))
    }

    /// Posts of the category keep existing with no category.
    pub async fn delete_category(&self, category_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let rows = sqlx::query(
            "SELECT id, name, is_published, created_at \
             FROM locations ORDER BY name ASC, id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(location_from_row).collect())
    }

    pub async fn create_location(&self, name: String, is_published: bool) -> Result<Location> {
        let row = sqlx::query(
            "INSERT INTO locations (name, is_published) VALUES ($1, $2) \
             RETURNING id, name, is_published, created_at",
        )
        .bind(name)
        .bind(is_published)
        .fetch_one(self.db.pool())
        .await?;

        Ok(location_from_row(&row))
    }

    /// Posts at the location keep existing with no location.
    pub async fn delete_location(&self, location_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(location_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
