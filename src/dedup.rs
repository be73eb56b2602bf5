use crate::models::WaterfallResult;
use moka::future::Cache;
use std::future::Future;
use std::time::Duration;

/// Collapses concurrent duplicate runs for the same lead key into one
/// execution.
///
/// Built on moka's per-key init coalescing: for any key, at most one factory
/// future is evaluated at any instant; concurrent callers for the same key
/// join the in-flight evaluation and all receive the identical result.
/// Completed results are retained for a short grace window so a
/// near-simultaneous duplicate request does not trigger a second run.
pub struct DedupGuard {
    runs: Cache<String, WaterfallResult>,
}

impl DedupGuard {
    pub fn new(retention: Duration) -> Self {
        Self {
            runs: Cache::builder()
                .time_to_live(retention)
                .max_capacity(10_000)
                .build(),
        }
    }

    /// Runs `factory` for `key` unless a run is already in flight or a
    /// result completed within the retention window, in which case the
    /// existing outcome is returned without starting a second run.
    pub async fn run_exclusive<F>(&self, key: &str, factory: F) -> WaterfallResult
    where
        F: Future<Output = WaterfallResult>,
    {
        self.runs.get_with(key.to_string(), factory).await
    }
}
