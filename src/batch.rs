use crate::errors::{AppError, ResultExt};
use crate::models::{BatchReport, LeadErrorEntry, LeadLookupInput, LeadResultEntry, WaterfallStatus};
use crate::waterfall::WaterfallEngine;
use std::future::Future;
use std::sync::Arc;

/// Resolves a lead id to its canonical lookup fields. External collaborator
/// responsibility (CRM, database, upstream API).
pub trait LeadResolver: Send + Sync + 'static {
    fn resolve(
        &self,
        lead_id: &str,
    ) -> impl Future<Output = Result<LeadLookupInput, AppError>> + Send;
}

/// Fans a list of lead ids out to independent waterfall runs and collects the
/// per-lead results into a summary.
///
/// Resolution failures are reported in the error list and never enter the
/// orchestrator; every successfully resolved lead gets a result entry, even
/// when its run ends in `error`. No lead's failure aborts a sibling run.
pub struct BatchCoordinator<R> {
    engine: Arc<WaterfallEngine>,
    resolver: Arc<R>,
}

impl<R: LeadResolver> BatchCoordinator<R> {
    pub fn new(engine: Arc<WaterfallEngine>, resolver: Arc<R>) -> Self {
        Self { engine, resolver }
    }

    pub async fn enrich_batch(&self, lead_ids: &[String]) -> BatchReport {
        tracing::info!("Starting batch enrichment for {} lead(s)", lead_ids.len());

        let mut handles = Vec::with_capacity(lead_ids.len());
        for lead_id in lead_ids {
            let engine = Arc::clone(&self.engine);
            let resolver = Arc::clone(&self.resolver);
            let lead_id = lead_id.clone();
            handles.push((
                lead_id.clone(),
                tokio::spawn(async move {
                    let input = resolver
                        .resolve(&lead_id)
                        .await
                        .with_context(|| format!("resolving lead {}", lead_id))?;
                    Ok::<_, AppError>(engine.enrich(input).await)
                }),
            ));
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();
        let mut found_count = 0;

        for (lead_id, handle) in handles {
            match handle.await {
                Ok(Ok(result)) => {
                    if result.status == WaterfallStatus::Found {
                        found_count += 1;
                    }
                    results.push(LeadResultEntry {
                        lead_id,
                        status: result.status,
                        phone: result.phone,
                        provider: result.provider,
                    });
                }
                Ok(Err(err)) => {
                    tracing::warn!("✗ lead {} did not reach the waterfall: {}", lead_id, err);
                    errors.push(LeadErrorEntry {
                        // The name is unknown when resolution fails; echo the id.
                        lead_name: lead_id.clone(),
                        lead_id,
                        error: err.to_string(),
                    });
                }
                Err(join_err) => {
                    let err = AppError::InternalError(format!("lead task failed: {}", join_err));
                    tracing::error!("✗ task for lead {} panicked: {}", lead_id, join_err);
                    errors.push(LeadErrorEntry {
                        lead_name: lead_id.clone(),
                        lead_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Batch complete: {} found, {} result(s), {} error(s)",
            found_count,
            results.len(),
            errors.len()
        );

        BatchReport {
            success: errors.is_empty(),
            found_count,
            results,
            errors,
        }
    }
}
