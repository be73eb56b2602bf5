use crate::errors::ProviderError;
use crate::models::{AttemptOutcome, AttemptRecord, LookupOutcome};
use crate::rate_limiter::RateLimiter;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;

/// Bounded-attempt retry with exponential backoff for one provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Backoff applied after the given 1-based attempt fails transiently:
    /// `initial_interval * multiplier^(attempt - 1)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        self.initial_interval
            .mul_f64(self.backoff_multiplier.powi(exponent))
    }

    /// Runs `call` up to `max_attempts` times and classifies the terminal
    /// outcome.
    ///
    /// Every attempt independently goes through the rate limiter's `admit`
    /// and is wrapped in the per-attempt timeout; a timed-out attempt counts
    /// as a transient failure. A valid empty response and a permanent error
    /// both terminate without further attempts. Backoff waiting suspends only
    /// the current run.
    pub async fn execute<F, Fut>(
        &self,
        provider: &str,
        limiter: &RateLimiter,
        attempt_timeout: Duration,
        mut call: F,
    ) -> (Vec<AttemptRecord>, LookupOutcome)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<String>, ProviderError>>,
    {
        let mut records = Vec::new();
        if self.max_attempts == 0 {
            return (
                records,
                LookupOutcome::Failed("retry policy allows no attempts".to_string()),
            );
        }

        for attempt in 1..=self.max_attempts {
            limiter.admit().await;

            let started_at = Utc::now();
            let clock = tokio::time::Instant::now();
            let outcome = match tokio::time::timeout(attempt_timeout, call()).await {
                Ok(Ok(Some(phone))) => AttemptOutcome::Found(phone),
                Ok(Ok(None)) => AttemptOutcome::Empty,
                Ok(Err(ProviderError::Transient(reason))) => AttemptOutcome::Transient(reason),
                Ok(Err(ProviderError::Permanent(reason))) => AttemptOutcome::Permanent(reason),
                Err(_) => AttemptOutcome::Transient(format!(
                    "attempt timed out after {:?}",
                    attempt_timeout
                )),
            };
            let latency = clock.elapsed();
            records.push(AttemptRecord {
                provider: provider.to_string(),
                attempt,
                started_at,
                outcome: outcome.clone(),
                latency,
            });

            match outcome {
                AttemptOutcome::Found(phone) => {
                    tracing::debug!(
                        provider,
                        attempt,
                        latency_ms = latency.as_millis() as u64,
                        "✓ provider returned a phone"
                    );
                    return (records, LookupOutcome::Found(phone));
                }
                AttemptOutcome::Empty => {
                    tracing::debug!(provider, attempt, "provider has no data for this lead");
                    return (records, LookupOutcome::Empty);
                }
                AttemptOutcome::Permanent(reason) => {
                    tracing::warn!(provider, attempt, "✗ permanent failure: {}", reason);
                    return (records, LookupOutcome::Failed(reason));
                }
                AttemptOutcome::Transient(reason) => {
                    if attempt == self.max_attempts {
                        tracing::warn!(
                            provider,
                            attempt,
                            "✗ retries exhausted, last error: {}",
                            reason
                        );
                        return (
                            records,
                            LookupOutcome::Failed(format!(
                                "retries exhausted after {} attempts: {}",
                                attempt, reason
                            )),
                        );
                    }
                    let wait = self.backoff_for(attempt);
                    tracing::debug!(
                        provider,
                        attempt,
                        backoff_ms = wait.as_millis() as u64,
                        "transient failure, backing off: {}",
                        reason
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }

        unreachable!("retry loop always returns a terminal outcome")
    }
}
