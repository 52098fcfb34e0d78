pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use time::UtcOffset;

use crate::app::auth::AuthService;
use crate::config::AppConfig;
use crate::infra::{cache::RedisCache, db::Db, storage::ObjectStorage};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub cache: RedisCache,
    pub storage: ObjectStorage,
    pub upload_url_ttl_seconds: u64,
    pub upload_max_bytes: i64,
    pub admin_token: Option<String>,
    pub paseto_access_key: [u8; 32],
    pub paseto_refresh_key: [u8; 32],
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
    pub posts_per_page: i64,
    pub default_utc_offset: UtcOffset,
}

impl AppState {
    pub fn new(config: &AppConfig, db: Db, cache: RedisCache, storage: ObjectStorage) -> Self {
        Self {
            db,
            cache,
            storage,
            upload_url_ttl_seconds: config.upload_url_ttl_seconds,
            upload_max_bytes: config.upload_max_bytes,
            admin_token: config.admin_token.clone(),
            paseto_access_key: config.paseto_access_key,
            paseto_refresh_key: config.paseto_refresh_key,
            access_ttl_minutes: config.access_ttl_minutes,
            refresh_ttl_days: config.refresh_ttl_days,
            posts_per_page: config.posts_per_page,
            default_utc_offset: config.default_utc_offset,
        }
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.db.clone(),
            self.paseto_access_key,
            self.paseto_refresh_key,
            self.access_ttl_minutes,
            self.refresh_ttl_days,
        )
    }
}
