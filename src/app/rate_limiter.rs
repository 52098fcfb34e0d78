use anyhow::Result;
use redis::AsyncCommands;

use crate::config::rate_limits::{current_window, IpRateLimit};
use crate::infra::cache::RedisCache;

pub struct RateLimitInfo {
    pub limited: bool,
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Clone)]
pub struct RateLimiter {
    cache: RedisCache,
}

impl RateLimiter {
    pub fn new(cache: RedisCache) -> Self {
        Self { cache }
    }

    /// Check rate limit by IP address (for unauthenticated requests)
    pub async fn check_ip_rate_limit(&self, ip: &str, rule: IpRateLimit) -> Result<RateLimitInfo> {
        let key = ip_key(ip, rule);
        let mut conn = self.cache.connection().await?;

        let count: u32 = conn.get(&key).await.unwrap_or(0);
        if count >= rule.limit {
            tracing::debug!(
                ip = ip,
                action = rule.action,
                count = count,
                limit = rule.limit,
                "IP rate limit exceeded"
            );
            return Ok(RateLimitInfo {
                limited: true,
                limit: rule.limit,
                remaining: 0,
            });
        }

        Ok(RateLimitInfo {
            limited: false,
            limit: rule.limit,
            remaining: rule.limit - count,
        })
    }

    /// Increment IP-based rate limit counter
    pub async fn increment_ip(&self, ip: &str, rule: IpRateLimit) -> Result<()> {
        let key = ip_key(ip, rule);
        let mut conn = self.cache.connection().await?;

        let count: u32 = conn.incr(&key, 1).await?;
        if count == 1 {
            let _: () = conn.expire(&key, rule.window.seconds() as i64).await?;
        }

        Ok(())
    }
}

fn ip_key(ip: &str, rule: IpRateLimit) -> String {
    format!(
        "ratelimit:ip:{}:{}:{}",
        ip,
        rule.action,
        current_window(rule.window.seconds())
    )
}
