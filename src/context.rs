/// Application context and dependency injection
///
/// Store handles are created once at startup and injected into components,
/// never reached for as ambient globals.
use crate::{
    account::AccountManager,
    billing::{BillingClient, SubscriptionManager},
    cache::{CacheClient, VolatileStore},
    config::ServerConfig,
    db,
    error::ApiResult,
    rate_limit::RateLimiter,
    referral::ReferralLedger,
    strategy::{
        GenerationOrchestrator, QuotaLedger, RemoteGenerator, ResultCache, StrategyGenerator,
        StrategyStore,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub accounts: Arc<AccountManager>,
    pub strategies: Arc<StrategyStore>,
    pub quota: Arc<QuotaLedger>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub subscriptions: Arc<SubscriptionManager>,
    pub referrals: Arc<ReferralLedger>,
    pub billing: Option<Arc<BillingClient>>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Whether the volatile store came up; reported by the health endpoint
    pub cache_enabled: bool,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        // Primary database
        let pool =
            db::create_pool(&config.storage.database_path, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        // Volatile store is optional: when it cannot be reached the service
        // degrades to recompute-everything / fail-open quota.
        let cache = match CacheClient::connect(&config.cache).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Redis unavailable, caching and quota degraded: {}", e);
                None
            }
        };
        let cache_enabled = cache.is_some();
        let volatile: Option<Arc<dyn VolatileStore>> =
            cache.map(|client| Arc::new(client) as Arc<dyn VolatileStore>);

        let accounts = Arc::new(AccountManager::new(pool.clone()));
        let strategies = Arc::new(StrategyStore::new(pool.clone()));
        let quota = Arc::new(QuotaLedger::new(volatile.clone(), config.cache.usage_window));
        let result_cache = Arc::new(ResultCache::new(volatile, config.cache.result_ttl));

        let generator: Option<Arc<dyn StrategyGenerator>> =
            match RemoteGenerator::from_config(&config.generation) {
                Some(remote) => {
                    info!("Remote generation engine configured");
                    Some(Arc::new(remote))
                }
                None => {
                    info!("No generation engine configured, running in template mode");
                    None
                }
            };

        let orchestrator = Arc::new(GenerationOrchestrator::new(
            Arc::clone(&strategies),
            Arc::clone(&quota),
            result_cache,
            generator,
            Duration::from_secs(config.generation.timeout_secs),
            config.quota.clone(),
        ));

        let subscriptions = Arc::new(SubscriptionManager::new(pool.clone()));
        let referrals = Arc::new(ReferralLedger::new(pool.clone()));

        let billing = match &config.billing {
            Some(billing_config) => {
                info!("Billing provider configured");
                Some(Arc::new(BillingClient::new(billing_config.clone())))
            }
            None => {
                info!("Billing not configured, checkout disabled");
                None
            }
        };

        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            accounts,
            strategies,
            quota,
            orchestrator,
            subscriptions,
            referrals,
            billing,
            rate_limiter,
            cache_enabled,
        })
    }
}
