/// Strategy generation, history and feedback endpoints
use crate::{
    api::validate_payload,
    auth::AuthContext,
    context::AppContext,
    error::ApiResult,
    strategy::{StrategyFeedback, StrategyInput},
};
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

/// Build strategy routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/strategy", post(generate_strategy))
        .route("/api/history", get(get_history))
        .route("/api/strategy/:id", get(get_strategy))
        .route("/api/strategy/:id", delete(delete_strategy))
        .route("/api/feedback", post(submit_feedback))
}

/// Run one request through the generation pipeline
async fn generate_strategy(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(input): Json<StrategyInput>,
) -> ApiResult<Json<serde_json::Value>> {
    validate_payload(&input)?;

    let outcome = ctx.orchestrator.handle(&auth.user, &input).await?;

    Ok(Json(json!({
        "success": true,
        "strategy": outcome.strategy,
        "cached": outcome.cached,
        "generation_time": outcome.generation_time,
        "message": outcome.message,
    })))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<i64>,
}

/// List the caller's generation records, newest first
async fn get_history(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let records = ctx.strategies.find_by_user(&auth.user.id, limit).await?;

    let items: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "goal": r.goal,
                "audience": r.audience,
                "industry": r.industry,
                "platform": r.platform,
                "created_at": r.created_at,
                "generation_time": r.generation_secs,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "total": items.len(),
        "strategies": items,
    })))
}

/// Fetch one owned record
async fn get_strategy(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let record = ctx.strategies.find_by_id_for_user(&id, &auth.user.id).await?;

    Ok(Json(json!({
        "success": true,
        "strategy": record.output_data,
        "input": {
            "goal": record.goal,
            "audience": record.audience,
            "industry": record.industry,
            "platform": record.platform,
            "contentType": record.content_type,
        },
        "created_at": record.created_at,
        "generation_time": record.generation_secs,
    })))
}

/// Delete one owned record and re-arm the caller's quota window at zero
async fn delete_strategy(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    ctx.strategies
        .delete_by_id_for_user(&id, &auth.user.id)
        .await?;

    // Counter reset is best-effort; a store hiccup must not undo the delete
    if let Err(e) = ctx.quota.reset(&auth.user.id).await {
        warn!("Quota reset after delete failed for {}: {}", auth.user.id, e);
    }

    Ok(Json(json!({
        "success": true,
        "message": "Strategy deleted and quota reset",
    })))
}

/// Attach feedback (rating + comment) to an owned record
async fn submit_feedback(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(feedback): Json<StrategyFeedback>,
) -> ApiResult<Json<serde_json::Value>> {
    ctx.strategies
        .update_feedback(&auth.user.id, &feedback)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Feedback submitted",
    })))
}
