/// API routes and handlers
pub mod auth;
pub mod billing;
pub mod health;
pub mod profile;
pub mod referral;
pub mod strategy;

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use axum::Router;
use validator::Validate;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(strategy::routes())
        .merge(profile::routes())
        .merge(billing::routes())
        .merge(referral::routes())
}

/// Run derive-based validation and surface the failing fields
pub(crate) fn validate_payload<T: Validate>(payload: &T) -> ApiResult<()> {
    payload.validate().map_err(|errors| {
        let detail: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| format!("{}: {}", field, m))
                        .unwrap_or_else(|| format!("{}: invalid value", field))
                })
            })
            .collect();
        ApiError::Validation(detail.join("; "))
    })
}
