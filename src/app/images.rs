use anyhow::{anyhow, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::infra::{cache::RedisCache, storage::ObjectStorage};

/// Lifetime of presigned image download URLs.
pub const IMAGE_URL_TTL_SECONDS: u64 = 14400;

#[derive(Clone)]
pub struct ImageService {
    cache: RedisCache,
    storage: ObjectStorage,
}

#[derive(Debug, Serialize)]
pub struct UploadIntent {
    pub image_key: String,
    pub upload_url: String,
    pub expires_in_seconds: u64,
    pub headers: Vec<UploadHeader>,
}

#[derive(Debug, Serialize)]
pub struct UploadHeader {
    pub name: String,
    pub value: String,
}

impl ImageService {
    pub fn new(cache: RedisCache, storage: ObjectStorage) -> Self {
        Self { cache, storage }
    }

    pub async fn create_upload(
        &self,
        author_id: i64,
        content_type: &str,
        bytes: i64,
        expires_in_seconds: u64,
    ) -> Result<UploadIntent> {
        let ext = extension_from_content_type(content_type)?;
        let image_key = format!("{}{}.{}", key_prefix(author_id), Uuid::new_v4(), ext);

        let presigned = self
            .storage
            .presign_put(&image_key, content_type, bytes, expires_in_seconds)
            .await?;

        let headers = presigned
            .headers
            .into_iter()
            .map(|(name, value)| UploadHeader { name, value })
            .collect();

        Ok(UploadIntent {
            image_key,
            upload_url: presigned.url,
            expires_in_seconds,
            headers,
        })
    }

    /// Generate a presigned GET URL for an image key.
    /// Results are cached in Redis to avoid repeated S3 presign calls.
    pub async fn presigned_get_url(&self, key: &str, expires_in_seconds: u64) -> Option<String> {
        let cache_key = format!("presigned:{}", key);
        if let Some(cached) = self.cache.get_string(&cache_key).await {
            return Some(cached);
        }

        let url = match self.storage.presign_get(key, expires_in_seconds).await {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(error = ?err, key = key, "failed to presign image url");
                return None;
            }
        };

        // Cache with TTL = expires_in - 5 minutes safety margin
        self.cache
            .set_string(&cache_key, &url, expires_in_seconds.saturating_sub(300))
            .await;

        Some(url)
    }

    pub async fn populate_post_image_url(&self, post: &mut Post) {
        if let Some(key) = post.image.as_deref() {
            post.image_url = self.presigned_get_url(key, IMAGE_URL_TTL_SECONDS).await;
        }
    }

    /// Populate image_url for posts (parallelized with futures::join_all)
    pub async fn populate_post_image_urls(&self, posts: &mut [Post]) {
        let futures: Vec<_> = posts
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.image.clone().map(|key| (i, key)))
            .map(|(i, key)| async move {
                let url = self.presigned_get_url(&key, IMAGE_URL_TTL_SECONDS).await;
                (i, url)
            })
            .collect();

        let results = futures::future::join_all(futures).await;
        for (i, url) in results {
            posts[i].image_url = url;
        }
    }
}

fn key_prefix(author_id: i64) -> String {
    format!("posts/{}/", author_id)
}

/// Image keys are only accepted from the user they were issued to.
pub fn owns_image_key(author_id: i64, key: &str) -> bool {
    key.strip_prefix(&key_prefix(author_id))
        .map(|rest| !rest.is_empty() && !rest.contains('/'))
        .unwrap_or(false)
}

pub fn extension_from_content_type(content_type: &str) -> Result<&'static str> {
    match content_type {
        "image/jpeg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        _ => Err(anyhow!("unsupported content type")),
    }
}
