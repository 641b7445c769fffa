use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Request id carried as a request extension; copied into every `meta` block.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accepted bearer tokens for the protected routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from the configured bearer tokens.
    ///
    /// In development, an empty key list disables auth for local iteration.
    /// In non-development envs, an empty key list fails startup.
    pub fn from_keys(keys: &[String], is_development: bool) -> anyhow::Result<Self> {
        let mut api_keys: Vec<String> = keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        api_keys.sort();
        api_keys.dedup();

        if api_keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "KNAPS_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self::disabled());
            }

            anyhow::bail!(
                "KNAPS_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            api_keys: Arc::new(api_keys),
            enabled: true,
        })
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            api_keys: Arc::new(Vec::new()),
            enabled: false,
        }
    }

    /// Compares against every key so timing does not reveal which one matched.
    fn allows(&self, token: &str) -> bool {
        self.api_keys.iter().fold(false, |found, key| {
            let matched: bool = key.as_bytes().ct_eq(token.as_bytes()).into();
            found | matched
        })
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Tags every request with an id for the response envelope and logs.
///
/// A non-blank `x-request-id` header is reused, otherwise a v4 UUID is
/// minted. The id is echoed back in the response header of the same name.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Rejects protected requests whose bearer token is not configured.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));

    match token {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => {
            tracing::warn!(path = %req.uri().path(), "rejected request without valid bearer token");
            ApiError::new(
                request_id_of(&req),
                "unauthorized",
                "missing or invalid bearer token",
            )
            .into_response()
        }
    }
}

/// Counts protected requests against the shared fixed window.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        drop(window);
        return ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded")
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
