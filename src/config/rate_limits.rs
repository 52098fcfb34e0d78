/// Time window for rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateWindow {
    Hour,
    Day,
}

impl RateWindow {
    pub fn seconds(&self) -> u64 {
        match self {
            RateWindow::Hour => 3600,
            RateWindow::Day => 86400,
        }
    }
}

/// Per-IP limit on an unauthenticated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRateLimit {
    pub action: &'static str,
    pub limit: u32,
    pub window: RateWindow,
}

pub const LOGIN_LIMIT: IpRateLimit = IpRateLimit {
    action: "login",
    limit: 10,
    window: RateWindow::Hour,
};

pub const REGISTRATION_LIMIT: IpRateLimit = IpRateLimit {
    action: "registration",
    limit: 5,
    window: RateWindow::Day,
};

/// Which limit, if any, guards a request.
pub fn ip_limit_for(path: &str, method: &str) -> Option<IpRateLimit> {
    match (path, method) {
        ("/auth/login/", "POST") => Some(LOGIN_LIMIT),
        ("/auth/registration/", "POST") => Some(REGISTRATION_LIMIT),
        _ => None,
    }
}

/// Calculate current window timestamp for rate limiting
pub fn current_window(window_seconds: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    now / window_seconds
}
