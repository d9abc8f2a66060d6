//! Fixed-window request limits per client address.

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Mutex,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{AppError, AppResult, AppState};

const WINDOW: Duration = Duration::from_secs(60);

struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    limit: u32,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// Allows `limit` requests per client each minute. Zero disables limiting.
    pub fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request from `client` at `now`; false once the window is full.
    pub fn check(&self, client: IpAddr, now: Instant) -> bool {
        if self.limit == 0 {
            return true;
        }

        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        windows.retain(|_, w| now.duration_since(w.started) < WINDOW);

        let window = windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if window.count >= self.limit {
            return false;
        }
        window.count += 1;
        true
    }
}

pub async fn limit_ai_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    // Requests without connection info (in-process callers) share one bucket.
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.limiter.check(client, Instant::now()) {
        tracing::warn!(%client, "ai rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(request).await)
}
