/// Global request throttle
///
/// Coarse per-process limiter over all inbound requests; the per-user
/// generation quota lives in the pipeline, not here.
use crate::{config::RateLimitConfig, context::AppContext, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

pub struct RateLimiter {
    enabled: bool,
    limiter: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(config.requests_per_minute)
            .unwrap_or(NonZeroU32::new(30).unwrap());
        let quota = Quota::per_minute(per_minute);

        Self {
            enabled: config.enabled,
            limiter: Arc::new(GovernorLimiter::direct(quota)),
        }
    }

    /// Check the global limit
    pub fn check(&self) -> Result<(), ApiError> {
        if !self.enabled {
            return Ok(());
        }

        self.limiter
            .check()
            .map_err(|_| ApiError::QuotaExceeded)
            .map(|_| ())
    }
}

/// Rate limiting middleware applied to every route
pub async fn rate_limit_middleware(
    State(ctx): State<AppContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    ctx.rate_limiter.check()?;
    Ok(next.run(req).await)
}
