//! Paginated post listings: the home feed, a category feed and a profile feed.
//!
//! Every listing is ordered newest publication first and carries each post's
//! comment count.

use anyhow::Result;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;
use time::OffsetDateTime;

use crate::app::pagination::{Page, PageWindow};
use crate::app::posts::{post_from_row, POST_SELECT};
use crate::app::visibility::public_clause;
use crate::domain::category::Category;
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::infra::db::Db;

/// Which posts a listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Every publicly visible post.
    Home,
    /// Publicly visible posts of one category.
    Category(i64),
    /// Posts of one author; hidden ones only when the author is looking.
    Author { author_id: i64, include_hidden: bool },
}

impl FeedScope {
    pub fn for_profile(author_id: i64, viewer_id: Option<i64>) -> Self {
        FeedScope::Author {
            author_id,
            include_hidden: viewer_id == Some(author_id),
        }
    }

    fn filter(&self) -> String {
        match self {
            FeedScope::Home => public_clause(1),
            FeedScope::Category(_) => format!("p.category_id = $1 AND {}", public_clause(2)),
            FeedScope::Author {
                include_hidden: true,
                ..
            } => "p.author_id = $1".to_string(),
            FeedScope::Author { .. } => format!("p.author_id = $1 AND {}", public_clause(2)),
        }
    }

    /// Arguments matching the placeholders of [`FeedScope::filter`].
    fn arguments(&self, now: OffsetDateTime) -> PgArguments {
        let mut args = PgArguments::default();
        match *self {
            FeedScope::Home => args.add(now),
            FeedScope::Category(category_id) => {
                args.add(category_id);
                args.add(now);
            }
            FeedScope::Author {
                author_id,
                include_hidden,
            } => {
                args.add(author_id);
                if !include_hidden {
                    args.add(now);
                }
            }
        }
        args
    }

    fn param_count(&self) -> usize {
        match self {
            FeedScope::Home => 1,
            FeedScope::Category(_) => 2,
            FeedScope::Author {
                include_hidden: true,
                ..
            } => 1,
            FeedScope::Author { .. } => 2,
        }
    }

    fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM posts p \
             LEFT JOIN categories c ON c.id = p.category_id \
             WHERE {}",
            self.filter()
        )
    }

    fn page_sql(&self) -> String {
        let next = self.param_count() + 1;
        format!(
            "{} WHERE {} ORDER BY p.pub_date DESC, p.id DESC LIMIT ${} OFFSET ${}",
            POST_SELECT,
            self.filter(),
            next,
            next + 1
        )
    }
}

#[derive(Clone)]
pub struct FeedService {
    db: Db,
    per_page: i64,
}

impl FeedService {
    pub fn new(db: Db, per_page: i64) -> Self {
        Self { db, per_page }
    }

    pub async fn list(
        &self,
        scope: FeedScope,
        page: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Page<Post>> {
        let count_sql = scope.count_sql();
        let count: i64 = sqlx::query_scalar_with(&count_sql, scope.arguments(now))
            .fetch_one(self.db.pool())
            .await?;

        let window = PageWindow::resolve(page, count, self.per_page);
        if count == 0 {
            return Ok(window.into_page(Vec::new()));
        }

        let page_sql = scope.page_sql();
        let mut args = scope.arguments(now);
        args.add(window.limit());
        args.add(window.offset());
        let rows = sqlx::query_with(&page_sql, args)
            .fetch_all(self.db.pool())
            .await?;

        let posts = rows.iter().map(post_from_row).collect();
        Ok(window.into_page(posts))
    }

    pub async fn home_feed(&self, page: Option<&str>, now: OffsetDateTime) -> Result<Page<Post>> {
        self.list(FeedScope::Home, page, now).await
    }

    /// The category must already be known to be published.
    pub async fn category_feed(
        &self,
        category: &Category,
        page: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Page<Post>> {
        self.list(FeedScope::Category(category.id), page, now).await
    }

    pub async fn profile_feed(
        &self,
        author: &User,
        viewer_id: Option<i64>,
        page: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Page<Post>> {
        self.list(FeedScope::for_profile(author.id, viewer_id), page, now)
            .await
    }
}
