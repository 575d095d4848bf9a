use std::time::Duration;

use rama::telemetry::tracing;
use tokio::time::Instant;

use crate::config::SimulationConfig;

use super::{
    outcome::OutcomeClass,
    random::VariateStream,
    result::{ReadResult, ReadStatus},
};

/// What a read is going to look like, decided before any time is spent on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPlan {
    /// `None` when the service time was predetermined by the caller.
    pub class: Option<OutcomeClass>,
    pub result: ReadResult,
}

/// Decide class, byte count and service time of a read.
///
/// A predetermined service time bypasses classification:
/// the read succeeds with a freshly drawn byte count.
pub fn plan_read(
    predetermined_elapsed_ms: Option<u64>,
    stream: &mut VariateStream,
    cfg: &SimulationConfig,
) -> ReadPlan {
    if let Some(elapsed_ms) = predetermined_elapsed_ms {
        return ReadPlan {
            class: None,
            result: ReadResult {
                status: ReadStatus::Success,
                bytes_read: random_bytes_read(stream, cfg),
                elapsed_ms,
            },
        };
    }

    // one draw decides the class, it is never redrawn
    let class = OutcomeClass::classify(stream.random_value(), cfg);
    let range = class.range(cfg);
    let elapsed_ms = secs_to_ms(stream.random_value_between(range.min, range.max));

    let mut result = match class {
        OutcomeClass::IoFailure => ReadResult {
            status: ReadStatus::IoFailure,
            bytes_read: 0,
            elapsed_ms,
        },
        OutcomeClass::SlowRead | OutcomeClass::NormalRead => ReadResult {
            status: ReadStatus::Success,
            bytes_read: random_bytes_read(stream, cfg),
            elapsed_ms,
        },
    };

    // slow reads are allowed to run past the timeout, and are caught after the fact
    if class == OutcomeClass::NormalRead && elapsed_ms > cfg.read_timeout_ms() {
        let overage_ms =
            secs_to_ms(stream.random_value_between(0., cfg.max_time_above_timeout_secs));
        result.time_out(cfg.read_timeout_ms().saturating_add(overage_ms));
    }

    ReadPlan {
        class: Some(class),
        result,
    }
}

/// Spend the planned service time and reconcile the outcome with
/// the time that was actually spent.
pub async fn simulate_read(plan: ReadPlan, file_path: &str, cfg: &SimulationConfig) -> ReadResult {
    let ReadPlan { class, mut result } = plan;

    let start = Instant::now();
    if result.elapsed_ms > 0 {
        tokio::time::sleep(Duration::from_millis(result.elapsed_ms)).await;
    }
    let measured_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result.status {
        ReadStatus::ReadTimeout => {
            tracing::debug!(
                file.path = file_path,
                elapsed_ms = result.elapsed_ms,
                "timeout (assigned)"
            );
        }
        ReadStatus::IoFailure => {
            tracing::debug!(
                file.path = file_path,
                elapsed_ms = result.elapsed_ms,
                "io fail"
            );
        }
        ReadStatus::Success => {
            if reclassify_after_service(&mut result, measured_ms, cfg) {
                tracing::debug!(
                    file.path = file_path,
                    elapsed_ms = result.elapsed_ms,
                    class = class.map(OutcomeClass::as_str).unwrap_or("predetermined"),
                    "timeout (service)"
                );
            }
        }
        ReadStatus::QueueTimeout => (),
    }

    result
}

/// A read that would otherwise have succeeded turns into a timeout
/// when its service time exceeds the timeout. Returns whether it did.
pub fn reclassify_after_service(
    result: &mut ReadResult,
    measured_ms: u64,
    cfg: &SimulationConfig,
) -> bool {
    if result.status != ReadStatus::Success || measured_ms <= cfg.read_timeout_ms() {
        return false;
    }
    result.time_out(measured_ms);
    true
}

fn random_bytes_read(stream: &mut VariateStream, cfg: &SimulationConfig) -> u64 {
    stream.random_value_between(0., cfg.max_read_bytes as f64) as u64
}

#[inline]
fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.) as u64
}

#[cfg(test)]
mod tests;
