use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;

use crate::app::rate_limiter::RateLimiter;
use crate::config::rate_limits::ip_limit_for;
use crate::http::AppError;
use crate::AppState;

/// IP-based rate limiting for unauthenticated endpoints (login, registration)
pub async fn ip_rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let rule = match ip_limit_for(request.uri().path(), request.method().as_str()) {
        Some(rule) => rule,
        None => return Ok(next.run(request).await),
    };

    let ip = addr.ip().to_string();
    let rate_limiter = RateLimiter::new(state.cache.clone());

    let info = match rate_limiter.check_ip_rate_limit(&ip, rule).await {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!(error = ?err, action = rule.action, "IP rate limit unavailable, allowing request");
            return Ok(next.run(request).await);
        }
    };

    if info.limited {
        tracing::warn!(ip = ip, action = rule.action, limit = info.limit, "IP rate limit exceeded");
        return Err(AppError::rate_limited(
            "Too many attempts from your IP address. Please try again later.",
        ));
    }

    tracing::debug!(ip = ip, action = rule.action, remaining = info.remaining, "IP rate limit checked");
    if let Err(err) = rate_limiter.increment_ip(&ip, rule).await {
        tracing::warn!(error = ?err, "failed to increment IP rate limit counter");
    }

    Ok(next.run(request).await)
}
