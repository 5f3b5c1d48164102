/// Health and service-description endpoints
use crate::{context::AppContext, db};
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::json;

/// Build health routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
}

/// Service banner
async fn root(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Stratify - AI Content Strategy Planner API",
        "version": ctx.config.service.version,
        "cache": if ctx.cache_enabled { "enabled" } else { "disabled" },
        "billing": if ctx.billing.is_some() { "enabled" } else { "disabled" },
    }))
}

/// Health check: database connectivity plus degraded-mode report for the
/// volatile store
async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    let db_status = match db::test_connection(&ctx.db).await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": if db_status == "healthy" { "operational" } else { "degraded" },
        "database": db_status,
        "cache": if ctx.cache_enabled { "healthy" } else { "disabled" },
        "timestamp": chrono::Utc::now(),
    }))
}
