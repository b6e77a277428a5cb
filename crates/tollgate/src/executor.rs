// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The cost-aware executor: one paid call, guarded end to end.
//!
//! A single invocation walks a strict sequence with no branching back:
//! fingerprint, cache check, token count, routing, estimation, budget
//! check, optional confirmation, the paid call, cache write-through, and
//! the ledger record. Soft failures before the budget check degrade
//! (cache errors become misses, counting failures estimate blind); from
//! the budget check on, any error aborts and the backend is never invoked
//! after a rejection or a cancellation.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use tollgate_cache::{fingerprint, ResponseCache};
use tollgate_config::{CostConfig, TollgateConfig};
use tollgate_core::{
    BackendAdapter, ConfirmRequest, Confirmer, Decision, TokenUsage, TollgateError,
};
use tollgate_cost::{
    ActivityLedger, ActivityRecord, BudgetGuard, CacheStats, LedgerBreakdown, PriceBook,
    PricingEntry,
};
use tollgate_router::ModelRouter;

/// The outcome of one guarded generation.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The generated payload, passed through uninterpreted.
    pub text: String,
    /// Real token usage reported by the backend (zero for cache hits).
    pub usage: TokenUsage,
    /// The model that produced the response.
    pub model: String,
    /// Real cost in USD (zero for cache hits).
    pub cost_usd: f64,
    /// Whether the response came from the cache.
    pub cache_hit: bool,
}

/// Orchestrates cache, pricing, routing, budget, and confirmation around a
/// caller-supplied generation function.
pub struct CostAwareExecutor {
    backend: Arc<dyn BackendAdapter>,
    confirmer: Arc<dyn Confirmer>,
    cache: Option<ResponseCache>,
    ledger: ActivityLedger,
    guard: BudgetGuard,
    router: ModelRouter,
    prices: PriceBook,
    cost: CostConfig,
    routing_enabled: bool,
}

impl CostAwareExecutor {
    /// Assemble an executor from already-opened collaborators.
    pub fn new(
        config: &TollgateConfig,
        cache: Option<ResponseCache>,
        ledger: ActivityLedger,
        backend: Arc<dyn BackendAdapter>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let guard = BudgetGuard::new(&config.cost, ledger.clone());
        Self {
            backend,
            confirmer,
            cache,
            ledger,
            guard,
            router: ModelRouter::new(config.routing.clone()),
            prices: PriceBook::with_defaults(),
            cost: config.cost.clone(),
            routing_enabled: config.routing.enabled,
        }
    }

    /// Open the cache and ledger at their configured paths and assemble an
    /// executor. Failure to create either backing store is fatal.
    pub async fn from_config(
        config: &TollgateConfig,
        backend: Arc<dyn BackendAdapter>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Result<Self, TollgateError> {
        let cache = if config.cache.enabled {
            let ttl = Duration::from_secs(config.cache.ttl_hours * 3600);
            Some(ResponseCache::open(config.cache.resolve_dir(), ttl).await?)
        } else {
            None
        };
        let ledger = ActivityLedger::open(&config.ledger.resolve_path()).await?;
        Ok(Self::new(config, cache, ledger, backend, confirmer))
    }

    /// Register or overwrite a pricing entry at runtime.
    pub fn add_pricing(&mut self, provider: &str, model: &str, entry: PricingEntry) {
        self.prices.add_pricing(provider, model, entry);
    }

    /// Run one guarded generation.
    ///
    /// `generate` is only invoked once all gates pass, with the chosen model
    /// and the prompt; its error propagates unchanged.
    pub async fn wrap_generate<F, Fut>(
        &self,
        command: &str,
        prompt: &str,
        generate: F,
    ) -> Result<Generation, TollgateError>
    where
        F: FnOnce(String, String) -> Fut,
        Fut: Future<Output = Result<(String, TokenUsage), TollgateError>>,
    {
        let started = Instant::now();
        let provider = self.backend.provider_name();
        let original = self.backend.model_name();

        let key = fingerprint(&format!("{provider}:{original}:{prompt}"));

        if let Some(hit) = self.check_cache(command, &provider, &original, &key, started).await {
            return Ok(hit);
        }

        // Best-effort: a counting failure degrades the estimate to zero
        // input tokens, it never aborts the call.
        let input_tokens = match self.backend.count_tokens(prompt).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "token counting failed, estimating blind");
                0
            }
        };

        let suggested = if self.routing_enabled {
            self.router.select_model(command, input_tokens)
        } else {
            original.clone()
        };
        let has_suggestion = suggested != original;

        // If a suggestion will be surfaced the estimate prices that model,
        // since accepting it is the default answer.
        let estimate_model = if has_suggestion { &suggested } else { &original };
        let estimated_cost = self.prices.estimate(
            &provider,
            estimate_model,
            input_tokens,
            self.cost.estimated_output_tokens,
        );

        // Hard stop. Nothing below runs after a budget rejection.
        self.guard.check(estimated_cost).await?;

        let mut chosen = original.clone();
        let wants_confirmation =
            estimated_cost > self.cost.confirm_threshold_usd || has_suggestion;
        if wants_confirmation && !self.cost.skip_confirmation {
            let request = ConfirmRequest {
                command: command.to_string(),
                input_tokens,
                estimated_output_tokens: self.cost.estimated_output_tokens,
                estimated_cost_usd: estimated_cost,
                original_model: original.clone(),
                suggested_model: has_suggestion.then(|| suggested.clone()),
                rationale_key: has_suggestion
                    .then(|| self.router.rationale(command, &suggested).to_string()),
            };
            match self.confirmer.confirm(&request).await? {
                Decision::UseOriginal => {}
                Decision::UseSuggested if has_suggestion => chosen = suggested.clone(),
                Decision::UseSuggested => {}
                Decision::Cancel => return Err(TollgateError::Cancelled),
            }
        }

        let (text, usage) = generate(chosen.clone(), prompt.to_string()).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &text).await {
                warn!(error = %e, "cache write failed, result not cached");
            }
        }

        // The recorded cost always comes from the usage the backend actually
        // reported, never from the pre-call estimate.
        let cost_usd =
            self.prices
                .estimate(&provider, &chosen, usage.input_tokens, usage.output_tokens);
        let record = ActivityRecord::new(
            command,
            &provider,
            &chosen,
            &usage,
            cost_usd,
            started.elapsed().as_millis() as u64,
            false,
            &key,
        );
        if let Err(e) = self.ledger.record(&record).await {
            warn!(error = %e, "generation succeeded but its cost record was lost");
        }

        info!(command, model = %chosen, cost_usd, "generation completed");
        Ok(Generation {
            text,
            usage,
            model: chosen,
            cost_usd,
            cache_hit: false,
        })
    }

    /// Cache lookup with soft-failure semantics; records the hit.
    async fn check_cache(
        &self,
        command: &str,
        provider: &str,
        model: &str,
        key: &str,
        started: Instant,
    ) -> Option<Generation> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(Some(text)) => {
                let usage = TokenUsage::default();
                let record = ActivityRecord::new(
                    command,
                    provider,
                    model,
                    &usage,
                    0.0,
                    started.elapsed().as_millis() as u64,
                    true,
                    key,
                );
                if let Err(e) = self.ledger.record(&record).await {
                    warn!(error = %e, "cache hit served but its record was lost");
                }
                info!(command, "response served from cache");
                Some(Generation {
                    text,
                    usage,
                    model: model.to_string(),
                    cost_usd: 0.0,
                    cache_hit: true,
                })
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    // --- Reporting and maintenance passthroughs ---

    pub async fn daily_total(&self) -> Result<f64, TollgateError> {
        self.ledger.daily_total().await
    }

    pub async fn monthly_total(&self) -> Result<f64, TollgateError> {
        self.ledger.monthly_total().await
    }

    pub async fn breakdown_by_command(&self) -> Result<LedgerBreakdown, TollgateError> {
        self.ledger.breakdown_by_command().await
    }

    pub async fn forecast(&self) -> Result<f64, TollgateError> {
        self.ledger.forecast().await
    }

    pub async fn cache_stats(&self) -> Result<CacheStats, TollgateError> {
        self.ledger.cache_stats().await
    }

    pub async fn history(&self) -> Result<Vec<ActivityRecord>, TollgateError> {
        self.ledger.history().await
    }

    /// Sweep expired cache entries. A disabled cache is a no-op.
    pub async fn clean_expired(&self) -> Result<(), TollgateError> {
        match &self.cache {
            Some(cache) => cache.clean_expired().await,
            None => Ok(()),
        }
    }

    /// Delete the entire cache. A disabled cache is a no-op.
    pub async fn clean(&self) -> Result<(), TollgateError> {
        match &self.cache {
            Some(cache) => cache.clean().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tollgate_config::RoutingConfig;

    const SONNET: &str = "claude-sonnet-4-20250514";
    const HAIKU: &str = "claude-haiku-4-5-20250901";

    struct StubBackend {
        tokens: Result<u32, ()>,
    }

    #[async_trait]
    impl BackendAdapter for StubBackend {
        async fn count_tokens(&self, _prompt: &str) -> Result<u32, TollgateError> {
            self.tokens.map_err(|()| TollgateError::Provider {
                message: "counting endpoint unavailable".to_string(),
                source: None,
            })
        }

        fn model_name(&self) -> String {
            SONNET.to_string()
        }

        fn provider_name(&self) -> String {
            "anthropic".to_string()
        }
    }

    struct FixedConfirmer(Decision);

    #[async_trait]
    impl Confirmer for FixedConfirmer {
        async fn confirm(&self, _request: &ConfirmRequest) -> Result<Decision, TollgateError> {
            Ok(self.0)
        }
    }

    /// Fails the test if the gate is ever reached.
    struct UnreachableConfirmer;

    #[async_trait]
    impl Confirmer for UnreachableConfirmer {
        async fn confirm(&self, _request: &ConfirmRequest) -> Result<Decision, TollgateError> {
            panic!("the confirmation gate must not be reached");
        }
    }

    struct Fixture {
        config: TollgateConfig,
        tokens: u32,
        counting_fails: bool,
        decision: Option<Decision>,
        cache_dir: Option<std::path::PathBuf>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: TollgateConfig::default(),
                tokens: 1_000,
                counting_fails: false,
                decision: Some(Decision::UseOriginal),
                cache_dir: None,
            }
        }

        fn no_routing(mut self) -> Self {
            self.config.routing = RoutingConfig {
                enabled: false,
                ..RoutingConfig::default()
            };
            self
        }

        fn budget(mut self, usd: f64) -> Self {
            self.config.cost.daily_budget_usd = usd;
            self
        }

        fn skip_confirmation(mut self) -> Self {
            self.config.cost.skip_confirmation = true;
            self
        }

        fn decision(mut self, decision: Decision) -> Self {
            self.decision = Some(decision);
            self
        }

        /// The gate must never fire in this scenario.
        fn gate_unreachable(mut self) -> Self {
            self.decision = None;
            self
        }

        fn with_cache(mut self) -> Self {
            // Keep the directory past the fixture's drop: the executor built
            // from a temporary fixture must outlive it.
            self.cache_dir = Some(TempDir::new().unwrap().keep());
            self
        }

        async fn build(&self) -> CostAwareExecutor {
            let cache = match &self.cache_dir {
                Some(dir) => Some(
                    ResponseCache::open(dir.clone(), Duration::from_secs(3600))
                        .await
                        .unwrap(),
                ),
                None => None,
            };
            let ledger = ActivityLedger::open_in_memory().await.unwrap();
            let backend = Arc::new(StubBackend {
                tokens: if self.counting_fails {
                    Err(())
                } else {
                    Ok(self.tokens)
                },
            });
            let confirmer: Arc<dyn Confirmer> = match self.decision {
                Some(decision) => Arc::new(FixedConfirmer(decision)),
                None => Arc::new(UnreachableConfirmer),
            };
            CostAwareExecutor::new(&self.config, cache, ledger, backend, confirmer)
        }
    }

    /// A generate fn that records how often it ran and which model it got.
    fn counting_generate(
        calls: Arc<AtomicUsize>,
        usage: TokenUsage,
    ) -> impl FnOnce(String, String) -> std::pin::Pin<Box<dyn Future<Output = Result<(String, TokenUsage), TollgateError>> + Send>>
    {
        move |model, _prompt| {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok((format!("generated-by:{model}"), usage)) })
        }
    }

    #[tokio::test]
    async fn budget_rejection_never_invokes_the_backend() {
        // Sonnet estimate for 1000 in + 500 out is $0.0105 > $0.01 budget.
        let executor = Fixture::new()
            .no_routing()
            .budget(0.01)
            .gate_unreachable()
            .build()
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let result = executor
            .wrap_generate("commit", "diff --git a b", counting_generate(calls.clone(), TokenUsage::default()))
            .await;

        assert!(matches!(result, Err(TollgateError::BudgetExceeded { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "paid call must not happen");
    }

    #[tokio::test]
    async fn cancel_aborts_without_invoking_the_backend() {
        let executor = Fixture::new().decision(Decision::Cancel).build().await;

        let calls = Arc::new(AtomicUsize::new(0));
        let result = executor
            .wrap_generate("commit", "diff --git a b", counting_generate(calls.clone(), TokenUsage::default()))
            .await;

        assert!(matches!(result, Err(TollgateError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn accepted_suggestion_switches_the_model() {
        // commit at 1000 tokens routes to the cheap tier, away from Sonnet.
        let executor = Fixture::new().decision(Decision::UseSuggested).build().await;

        let calls = Arc::new(AtomicUsize::new(0));
        let generation = executor
            .wrap_generate(
                "commit",
                "diff --git a b",
                counting_generate(calls.clone(), TokenUsage { input_tokens: 900, output_tokens: 40 }),
            )
            .await
            .unwrap();

        assert_eq!(generation.model, HAIKU);
        assert_eq!(generation.text, format!("generated-by:{HAIKU}"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn declining_the_suggestion_keeps_the_original() {
        let executor = Fixture::new().decision(Decision::UseOriginal).build().await;

        let generation = executor
            .wrap_generate(
                "commit",
                "diff --git a b",
                counting_generate(Arc::new(AtomicUsize::new(0)), TokenUsage::default()),
            )
            .await
            .unwrap();

        assert_eq!(generation.model, SONNET);
    }

    #[tokio::test]
    async fn skip_confirmation_always_uses_the_original_model() {
        // Routing still suggests Haiku for "commit", but with confirmation
        // skipped the suggestion must never be applied silently.
        let executor = Fixture::new()
            .skip_confirmation()
            .gate_unreachable()
            .build()
            .await;

        let generation = executor
            .wrap_generate(
                "commit",
                "diff --git a b",
                counting_generate(Arc::new(AtomicUsize::new(0)), TokenUsage::default()),
            )
            .await
            .unwrap();

        assert_eq!(generation.model, SONNET);
    }

    #[tokio::test]
    async fn cheap_calls_without_suggestion_bypass_the_gate() {
        // Routing disabled and the estimate is under the threshold: the
        // unreachable confirmer proves the gate is skipped.
        let mut fixture = Fixture::new().no_routing().gate_unreachable();
        fixture.tokens = 100;
        let executor = fixture.build().await;

        let generation = executor
            .wrap_generate(
                "commit",
                "tiny",
                counting_generate(Arc::new(AtomicUsize::new(0)), TokenUsage::default()),
            )
            .await
            .unwrap();
        assert_eq!(generation.model, SONNET);
    }

    #[tokio::test]
    async fn counting_failure_degrades_but_does_not_abort() {
        let mut fixture = Fixture::new().no_routing().gate_unreachable();
        fixture.counting_fails = true;
        let executor = fixture.build().await;

        let calls = Arc::new(AtomicUsize::new(0));
        let generation = executor
            .wrap_generate(
                "commit",
                "diff",
                counting_generate(calls.clone(), TokenUsage { input_tokens: 800, output_tokens: 60 }),
            )
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!generation.cache_hit);
    }

    #[tokio::test]
    async fn recorded_cost_uses_actual_usage_not_the_estimate() {
        let executor = Fixture::new().no_routing().skip_confirmation().build().await;

        let usage = TokenUsage {
            input_tokens: 2_000,
            output_tokens: 1_000,
        };
        let generation = executor
            .wrap_generate("summarize", "a long diff", counting_generate(Arc::new(AtomicUsize::new(0)), usage))
            .await
            .unwrap();

        // Sonnet: 2000/1M*3.0 + 1000/1M*15.0
        let expected = 0.006 + 0.015;
        assert!((generation.cost_usd - expected).abs() < 1e-10);

        let history = executor.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert!((history[0].cost_usd - expected).abs() < 1e-10);
        assert_eq!(history[0].input_tokens, 2_000);
        assert!(!history[0].cache_hit);
        assert_eq!(history[0].content_hash.len(), 64);
    }

    #[tokio::test]
    async fn second_identical_call_is_a_free_cache_hit() {
        let executor = Fixture::new()
            .no_routing()
            .skip_confirmation()
            .with_cache()
            .build()
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let usage = TokenUsage {
            input_tokens: 500,
            output_tokens: 100,
        };

        let first = executor
            .wrap_generate("commit", "same diff", counting_generate(calls.clone(), usage))
            .await
            .unwrap();
        assert!(!first.cache_hit);

        let second = executor
            .wrap_generate("commit", "same diff", counting_generate(calls.clone(), usage))
            .await
            .unwrap();

        assert!(second.cache_hit);
        assert_eq!(second.cost_usd, 0.0);
        assert_eq!(second.text, first.text);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "hit must not re-generate");

        // Both attempts are in the ledger; the hit carries zero cost.
        let history = executor.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].cache_hit);
        assert_eq!(history[1].cost_usd, 0.0);
    }

    #[tokio::test]
    async fn upstream_error_propagates_unchanged() {
        let executor = Fixture::new().no_routing().skip_confirmation().build().await;

        let result = executor
            .wrap_generate("commit", "diff", |_model, _prompt| async {
                Err::<(String, TokenUsage), _>(TollgateError::Provider {
                    message: "upstream exploded".to_string(),
                    source: None,
                })
            })
            .await;

        match result {
            Err(TollgateError::Provider { message, .. }) => {
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected the upstream error, got {other:?}"),
        }

        // Failed attempts are not recorded.
        assert!(executor.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exactly_on_budget_still_runs() {
        // Estimate equals the remaining budget exactly: must pass.
        // 1M input tokens on Sonnet with no output estimate is exactly $3.
        let mut fixture = Fixture::new()
            .no_routing()
            .budget(3.0)
            .decision(Decision::UseOriginal);
        fixture.tokens = 1_000_000;
        fixture.config.cost.estimated_output_tokens = 0;
        let executor = fixture.build().await;

        let calls = Arc::new(AtomicUsize::new(0));
        let result = executor
            .wrap_generate("commit", "diff", counting_generate(calls.clone(), TokenUsage::default()))
            .await;

        assert!(result.is_ok(), "equality must not reject: {result:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
