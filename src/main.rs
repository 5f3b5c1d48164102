/// Stratify - AI content-strategy planner backend
///
/// Quota-gated, cache-deduplicated generation pipeline with webhook-driven
/// subscription state and a referral ledger.

mod account;
mod api;
mod auth;
mod billing;
mod cache;
mod config;
mod context;
mod db;
mod error;
mod rate_limit;
mod referral;
mod server;
mod strategy;

use config::ServerConfig;
use context::AppContext;
use error::ApiResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stratify=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let ctx = AppContext::new(config).await?;

    server::serve(ctx).await?;

    Ok(())
}
