/// The generation orchestrator
///
/// Composes the quota gate, result cache, generation collaborator (with its
/// deterministic fallback), record persistence and usage accounting into one
/// request flow.
use crate::{
    account::{Tier, User},
    config::QuotaConfig,
    error::{ApiError, ApiResult},
    strategy::{
        fallback, fingerprint, QuotaLedger, ResultCache, StrategyGenerator, StrategyInput,
        StrategyResult, StrategyStore,
    },
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of one generation request
#[derive(Debug, Serialize)]
pub struct StrategyOutcome {
    pub strategy: StrategyResult,
    pub cached: bool,
    /// Full-precision generation wall-clock seconds (0.0 on a cache hit)
    pub generation_time: f64,
    pub message: String,
}

pub struct GenerationOrchestrator {
    store: Arc<StrategyStore>,
    quota: Arc<QuotaLedger>,
    result_cache: Arc<ResultCache>,
    generator: Option<Arc<dyn StrategyGenerator>>,
    generation_timeout: Duration,
    quota_config: QuotaConfig,
}

impl GenerationOrchestrator {
    pub fn new(
        store: Arc<StrategyStore>,
        quota: Arc<QuotaLedger>,
        result_cache: Arc<ResultCache>,
        generator: Option<Arc<dyn StrategyGenerator>>,
        generation_timeout: Duration,
        quota_config: QuotaConfig,
    ) -> Self {
        Self {
            store,
            quota,
            result_cache,
            generator,
            generation_timeout,
            quota_config,
        }
    }

    /// Tier-dependent quota ceiling
    fn tier_limit(&self, user: &User) -> u64 {
        match user.effective_tier(Utc::now()) {
            Tier::Free => self.quota_config.free_limit,
            Tier::Pro => self.quota_config.pro_limit,
        }
    }

    /// Handle one generation request.
    ///
    /// Order matters: quota gate, then cache lookup, then generation with
    /// fallback, then write-through cache, then persistence, then usage
    /// accounting. A cache hit returns before generation and consumes no
    /// quota.
    pub async fn handle(&self, user: &User, input: &StrategyInput) -> ApiResult<StrategyOutcome> {
        let limit = self.tier_limit(user);
        if !self.quota.remaining(&user.id, limit).await {
            info!("Quota exhausted for user {} (limit {})", user.id, limit);
            return Err(ApiError::QuotaExceeded);
        }

        let cache_key = fingerprint::derive(input);

        if let Some(strategy) = self.result_cache.get(&cache_key).await {
            info!("Serving cached strategy {} for user {}", cache_key, user.id);
            return Ok(StrategyOutcome {
                strategy,
                cached: true,
                generation_time: 0.0,
                message: "Strategy retrieved from cache".to_string(),
            });
        }

        let started = Instant::now();
        let (strategy, message) = self.generate_with_fallback(input).await;
        let elapsed = started.elapsed();

        // Write-through, whichever path produced the result
        self.result_cache.put(&cache_key, &strategy).await;

        // Persistence failure after a successful generation is surfaced as an
        // error; the cache write above is not compensated.
        let record_id = self
            .store
            .insert(
                &user.id,
                input,
                &strategy,
                &cache_key,
                elapsed.as_secs() as i64,
            )
            .await?;

        // Usage accounting is non-fatal: a counter-store failure is logged
        // and the completed generation is still returned.
        match self.quota.record_usage(&user.id).await {
            Ok(count) => info!(
                "Strategy {} generated for user {} ({}/{} used)",
                record_id, user.id, count, limit
            ),
            Err(e) => warn!("Failed to record usage for {}: {}", user.id, e),
        }

        Ok(StrategyOutcome {
            strategy,
            cached: false,
            generation_time: elapsed.as_secs_f64(),
            message,
        })
    }

    /// Invoke the collaborator under a bounded timeout; any fault or timeout
    /// falls back to the deterministic template generator.
    async fn generate_with_fallback(&self, input: &StrategyInput) -> (StrategyResult, String) {
        let Some(generator) = &self.generator else {
            return (
                fallback::generate(input),
                "Generated from template (no AI engine configured)".to_string(),
            );
        };

        match tokio::time::timeout(self.generation_timeout, generator.generate(input)).await {
            Ok(Ok(result)) => (result, "Strategy generated successfully".to_string()),
            Ok(Err(e)) => {
                warn!("Generation collaborator faulted, using fallback: {}", e);
                (
                    fallback::generate(input),
                    format!("AI engine error, served template strategy: {}", e),
                )
            }
            Err(_) => {
                warn!(
                    "Generation timed out after {:?}, using fallback",
                    self.generation_timeout
                );
                (
                    fallback::generate(input),
                    "AI engine timed out, served template strategy".to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{memory::MemoryStore, VolatileStore};
    use crate::error::ApiError;
    use async_trait::async_trait;

    struct FaultingGenerator;

    #[async_trait]
    impl StrategyGenerator for FaultingGenerator {
        async fn generate(&self, _input: &StrategyInput) -> ApiResult<StrategyResult> {
            Err(ApiError::ServiceUnavailable("engine down".to_string()))
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl StrategyGenerator for SlowGenerator {
        async fn generate(&self, input: &StrategyInput) -> ApiResult<StrategyResult> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(fallback::generate(input))
        }
    }

    fn input() -> StrategyInput {
        StrategyInput {
            goal: "Grow newsletter subscribers".to_string(),
            audience: "small business owners".to_string(),
            industry: "retail".to_string(),
            platform: "Instagram".to_string(),
            content_type: "Mixed Content".to_string(),
        }
    }

    fn orchestrator_with(generator: Option<Arc<dyn StrategyGenerator>>) -> GenerationOrchestrator {
        // Store is unused by generate_with_fallback; a lazy pool keeps these
        // tests free of real I/O.
        let pool = sqlx::SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        GenerationOrchestrator::new(
            Arc::new(StrategyStore::new(pool)),
            Arc::new(QuotaLedger::new(None, 86400)),
            Arc::new(ResultCache::new(None, 86400)),
            generator,
            Duration::from_millis(50),
            QuotaConfig {
                free_limit: 3,
                pro_limit: 500,
            },
        )
    }

    #[tokio::test]
    async fn test_fault_falls_back_to_template() {
        let orch = orchestrator_with(Some(Arc::new(FaultingGenerator)));
        let (result, message) = orch.generate_with_fallback(&input()).await;
        assert_eq!(result.personas.len(), 3);
        assert!(message.contains("template"));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_template() {
        let orch = orchestrator_with(Some(Arc::new(SlowGenerator)));
        let (result, message) = orch.generate_with_fallback(&input()).await;
        assert_eq!(result.personas.len(), 3);
        assert!(message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_no_generator_uses_template() {
        let orch = orchestrator_with(None);
        let (_, message) = orch.generate_with_fallback(&input()).await;
        assert!(message.contains("no AI engine configured"));
    }

    fn test_user() -> User {
        User {
            id: "u1".to_string(),
            email: "a@x.example".to_string(),
            password_hash: String::new(),
            name: None,
            photo: None,
            tier: Tier::Free,
            pro_until: None,
            subscription_id: None,
            referral_code: None,
            referral_count: 0,
            referred_by: None,
            referred_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_handle_persists_record_on_miss_path() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, tier, referral_count, created_at)
             VALUES ('u1', 'a@x.example', 'x', 'free', 0, ?1)",
        )
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        let store = Arc::new(StrategyStore::new(pool));
        let orch = GenerationOrchestrator::new(
            Arc::clone(&store),
            Arc::new(QuotaLedger::new(None, 86400)),
            Arc::new(ResultCache::new(None, 86400)),
            None,
            Duration::from_secs(1),
            QuotaConfig {
                free_limit: 3,
                pro_limit: 500,
            },
        );

        // With the volatile store absent this is always a miss and the
        // quota gate fails open
        let outcome = orch.handle(&test_user(), &input()).await.unwrap();
        assert!(!outcome.cached);
        assert!(outcome.generation_time >= 0.0);
        assert_eq!(outcome.strategy.personas.len(), 3);

        assert_eq!(store.count_for_user("u1").await.unwrap(), 1);
        let records = store.find_by_user("u1", 10).await.unwrap();
        assert_eq!(records[0].cache_key, fingerprint::derive(&input()));
    }

    async fn live_pipeline(
        free_limit: u64,
    ) -> (Arc<QuotaLedger>, Arc<StrategyStore>, GenerationOrchestrator) {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, tier, referral_count, created_at)
             VALUES ('u1', 'a@x.example', 'x', 'free', 0, ?1)",
        )
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        let volatile = Arc::new(MemoryStore::new()) as Arc<dyn VolatileStore>;
        let quota = Arc::new(QuotaLedger::new(Some(volatile.clone()), 86400));
        let store = Arc::new(StrategyStore::new(pool));
        let orch = GenerationOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&quota),
            Arc::new(ResultCache::new(Some(volatile), 86400)),
            None,
            Duration::from_secs(1),
            QuotaConfig {
                free_limit,
                pro_limit: 500,
            },
        );
        (quota, store, orch)
    }

    #[tokio::test]
    async fn test_repeat_request_is_served_from_cache_for_free() {
        let (quota, store, orch) = live_pipeline(3).await;
        let user = test_user();

        let first = orch.handle(&user, &input()).await.unwrap();
        assert!(!first.cached);
        assert_eq!(quota.usage("u1").await, 1);
        assert_eq!(store.count_for_user("u1").await.unwrap(), 1);

        // Identical input: served from cache, zero latency, no quota charge,
        // no new record
        let second = orch.handle(&user, &input()).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.generation_time, 0.0);
        assert!(second.message.contains("cache"));
        assert_eq!(quota.usage("u1").await, 1);
        assert_eq!(store.count_for_user("u1").await.unwrap(), 1);
        assert_eq!(
            serde_json::to_string(&second.strategy).unwrap(),
            serde_json::to_string(&first.strategy).unwrap()
        );
    }

    #[tokio::test]
    async fn test_user_at_limit_is_rejected_before_generation() {
        let (quota, store, orch) = live_pipeline(1).await;
        let user = test_user();

        // Below the limit the request goes through
        orch.handle(&user, &input()).await.unwrap();
        assert_eq!(quota.usage("u1").await, 1);

        // At exactly the limit a fresh input is rejected and nothing is
        // generated or recorded
        let mut fresh = input();
        fresh.goal = "Launch a product waitlist".to_string();
        let err = orch.handle(&user, &fresh).await.unwrap_err();
        assert!(matches!(err, ApiError::QuotaExceeded));
        assert_eq!(quota.usage("u1").await, 1);
        assert_eq!(store.count_for_user("u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_tier_limit_follows_effective_tier() {
        let orch = orchestrator_with(None);

        let free = test_user();
        assert_eq!(orch.tier_limit(&free), 3);

        let mut pro = test_user();
        pro.tier = Tier::Pro;
        assert_eq!(orch.tier_limit(&pro), 500);

        // An expired pro grant is capped like a free user
        pro.pro_until = Some(Utc::now() - chrono::Duration::days(1));
        assert_eq!(orch.tier_limit(&pro), 3);
    }
}
