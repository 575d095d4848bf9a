use tokio::time::Instant;

use crate::config::SimulationConfig;

/// Time a request spent between being accepted and being picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueWait {
    pub wait_ms: u64,
    pub timed_out: bool,
}

impl QueueWait {
    /// Evaluate the queue wait of a request received at `receipt_time`,
    /// as observed at `now`.
    ///
    /// The wait is compared in whole seconds, so a request times out
    /// in queue once it has waited at least `read_timeout_secs` full seconds.
    pub fn evaluate(receipt_time: Instant, now: Instant, cfg: &SimulationConfig) -> Self {
        let wait_ms =
            u64::try_from(now.saturating_duration_since(receipt_time).as_millis()).unwrap_or(u64::MAX);
        Self {
            wait_ms,
            timed_out: wait_ms / 1000 >= cfg.read_timeout_secs,
        }
    }
}
