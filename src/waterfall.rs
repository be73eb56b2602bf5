use crate::config::Config;
use crate::dedup::DedupGuard;
use crate::models::{LeadLookupInput, LookupOutcome, WaterfallResult};
use crate::providers::ProviderAdapter;
use crate::rate_limiter::RateLimiter;
use crate::retry::RetryPolicy;
use std::time::Duration;

struct ProviderSlot {
    adapter: ProviderAdapter,
    limiter: RateLimiter,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

/// Sequences the providers in priority order for one lead, short-circuiting
/// on the first phone found.
///
/// Rate limiter state is shared across all concurrent runs; the dedup guard
/// collapses concurrent runs for the same lead id into one execution.
pub struct WaterfallEngine {
    providers: Vec<ProviderSlot>,
    dedup: DedupGuard,
    run_deadline: Option<Duration>,
}

impl WaterfallEngine {
    pub fn new(config: &Config) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|settings| ProviderSlot {
                adapter: ProviderAdapter::new(
                    settings.kind,
                    settings.base_url.clone(),
                    settings.api_key.clone(),
                ),
                limiter: RateLimiter::new(settings.max_rps, settings.burst),
                policy: settings.retry.clone(),
                attempt_timeout: settings.attempt_timeout,
            })
            .collect();

        Self {
            providers,
            dedup: DedupGuard::new(config.dedup_retention),
            run_deadline: config.run_deadline,
        }
    }

    /// Entry point for one lead, keyed by its id: concurrent calls for the
    /// same lead join the in-flight run and receive the identical result.
    pub async fn enrich(&self, input: LeadLookupInput) -> WaterfallResult {
        let key = input.lead_id.clone();
        self.dedup.run_exclusive(&key, self.run(input)).await
    }

    /// One full waterfall run, without deduplication. Applies the optional
    /// overall deadline.
    pub async fn run(&self, input: LeadLookupInput) -> WaterfallResult {
        match self.run_deadline {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.run_providers(&input)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            lead_id = %input.lead_id,
                            "✗ waterfall run exceeded deadline of {:?}",
                            deadline
                        );
                        WaterfallResult::error(format!(
                            "waterfall run exceeded deadline of {:?}",
                            deadline
                        ))
                    }
                }
            }
            None => self.run_providers(&input).await,
        }
    }

    async fn run_providers(&self, input: &LeadLookupInput) -> WaterfallResult {
        tracing::info!(lead_id = %input.lead_id, "Starting phone waterfall");

        for (idx, slot) in self.providers.iter().enumerate() {
            let name = slot.adapter.name();
            let is_last = idx + 1 == self.providers.len();

            let Some(request) = slot.adapter.request_for(input) else {
                tracing::info!(
                    lead_id = %input.lead_id,
                    provider = name,
                    "required fields not derivable, skipping provider"
                );
                continue;
            };

            let (records, outcome) = slot
                .policy
                .execute(name, &slot.limiter, slot.attempt_timeout, || {
                    slot.adapter.lookup(request.clone())
                })
                .await;

            match outcome {
                LookupOutcome::Found(phone) => {
                    tracing::info!(
                        lead_id = %input.lead_id,
                        provider = name,
                        attempts = records.len(),
                        "✓ phone found"
                    );
                    return WaterfallResult::found(phone, name);
                }
                LookupOutcome::Empty => {
                    tracing::info!(
                        lead_id = %input.lead_id,
                        provider = name,
                        "no data, trying next provider"
                    );
                }
                LookupOutcome::Failed(reason) => {
                    // A failure on an early provider must not abort the
                    // lookup; exhausting the final provider is inconclusive
                    // and distinct from a confirmed not_found.
                    if is_last {
                        tracing::error!(
                            lead_id = %input.lead_id,
                            provider = name,
                            attempts = records.len(),
                            "✗ last provider failed hard: {}",
                            reason
                        );
                        return WaterfallResult::error(format!("{}: {}", name, reason));
                    }
                    tracing::warn!(
                        lead_id = %input.lead_id,
                        provider = name,
                        attempts = records.len(),
                        "✗ provider failed, trying next provider: {}",
                        reason
                    );
                }
            }
        }

        tracing::info!(lead_id = %input.lead_id, "No provider had a phone for this lead");
        WaterfallResult::not_found()
    }
}
