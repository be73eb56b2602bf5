use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};

/// Per-provider admission control at a configured maximum rate.
///
/// Cell-rate (GCRA) scheduling, the continuous equivalent of a token bucket:
/// the mutex guards a theoretical arrival time that advances by `1/rate` per
/// admission, and a caller may run ahead of it by up to `(burst - 1)`
/// intervals, which admits a bounded burst after idle periods. Each caller
/// computes its slot under the lock and sleeps outside it, so waiting never
/// blocks other runs. Callers are served in the order they acquire the lock
/// (FIFO, no starvation beyond queue order) and a slot is never handed out
/// twice.
pub struct RateLimiter {
    interval: Duration,
    slack: Duration,
    /// Theoretical arrival time of the next admission.
    tat: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter admitting `max_rps` calls per second (fractional
    /// rates allowed) with a burst allowance of at least 1.
    pub fn new(max_rps: f64, burst: u32) -> Self {
        let rate = if max_rps > 0.0 { max_rps } else { 1.0 };
        let burst = burst.max(1);
        let interval = Duration::from_secs_f64(1.0 / rate);
        Self {
            interval,
            slack: interval * (burst - 1),
            tat: Mutex::new(None),
        }
    }

    /// Suspends the caller until a slot is available, then returns.
    /// Never fails; it only delays.
    pub async fn admit(&self) {
        let slot = {
            let mut tat = self.tat.lock().await;
            let now = Instant::now();
            let current = tat.unwrap_or(now);
            let slot = match current.checked_sub(self.slack) {
                Some(earliest) => earliest.max(now),
                // The clock is too close to its origin to owe any wait.
                None => now,
            };
            // Resets idle credit to at most the burst allowance.
            *tat = Some(current.max(now) + self.interval);
            slot
        };
        time::sleep_until(slot).await;
    }
}
