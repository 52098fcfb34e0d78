use anyhow::Result;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};

#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let cache = Self::open(redis_url)?;
        cache.ping().await?;
        Ok(cache)
    }

    /// Builds the client without touching the server; connections are made
    /// per call.
    pub fn open(redis_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::open(redis_url)?,
        })
    }

    pub async fn connection(&self) -> Result<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }

    /// Best-effort read; an unreachable cache reads as a miss.
    pub async fn get_string(&self, key: &str) -> Option<String> {
        let mut conn = self.connection().await.ok()?;
        conn.get::<_, Option<String>>(key).await.ok().flatten()
    }

    /// Best-effort write with a TTL in seconds.
    pub async fn set_string(&self, key: &str, value: &str, ttl_seconds: u64) {
        if ttl_seconds == 0 {
            return;
        }
        match self.connection().await {
            Ok(mut conn) => {
                if let Err(err) = conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await {
                    tracing::warn!(error = ?err, key = key, "failed to write cache entry");
                }
            }
            Err(err) => tracing::warn!(error = ?err, "cache unavailable"),
        }
    }
}
