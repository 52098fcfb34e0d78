pub mod auth;
pub mod categories;
pub mod comments;
pub mod feed;
pub mod images;
pub mod pagination;
pub mod permissions;
pub mod posts;
pub mod rate_limiter;
pub mod users;
pub mod visibility;
