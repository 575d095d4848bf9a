use std::time::Duration;

use diskio_sim_lib::sim::ReadStatus;

mod human;
mod json;

pub use self::{human::HumanReporter, json::JsonlReporter};

pub trait Reporter: Send + Sync + 'static {
    fn on_result(&mut self, ev: &RequestResultEvent);
    fn on_tick(&mut self, now: Duration);
    fn finish(&mut self);
    /// Counters over every result reported so far.
    fn total_counts(&self) -> &Counters;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counters {
    pub total: u64,
    /// Indexed by status code.
    pub status: [u64; ReadStatus::ALL.len()],
    pub client_timeout: u64,
    pub transport_fail: u64,
    latency_sum: Duration,
    latency_max: Duration,
}

impl Counters {
    pub fn apply(&mut self, ev: &RequestResultEvent) {
        self.total += 1;
        self.latency_sum += ev.latency;
        self.latency_max = self.latency_max.max(ev.latency);

        match ev.outcome {
            RequestOutcome::Response { status, .. } => {
                self.status[usize::from(status.code())] += 1;
            }
            RequestOutcome::ClientTimeout => self.client_timeout += 1,
            RequestOutcome::TransportFailure => self.transport_fail += 1,
        }
    }

    #[inline]
    pub fn count(&self, status: ReadStatus) -> u64 {
        self.status[usize::from(status.code())]
    }

    pub fn latency_mean(&self) -> Duration {
        match u32::try_from(self.total) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.latency_sum / n,
            Err(_) => Duration::from_secs_f64(self.latency_sum.as_secs_f64() / self.total as f64),
        }
    }

    #[inline]
    pub fn latency_max(&self) -> Duration {
        self.latency_max
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "total": self.total,
            "success": self.count(ReadStatus::Success),
            "read_timeout": self.count(ReadStatus::ReadTimeout),
            "io_failure": self.count(ReadStatus::IoFailure),
            "queue_timeout": self.count(ReadStatus::QueueTimeout),
            "client_timeout": self.client_timeout,
            "transport_fail": self.transport_fail,
            "latency_mean_ms": self.latency_mean().as_millis(),
            "latency_max_ms": self.latency_max.as_millis(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Response {
        status: ReadStatus,
        bytes_read: u64,
        total_elapsed_ms: u64,
    },
    ClientTimeout,
    TransportFailure,
}

#[derive(Debug)]
pub struct RequestResultEvent {
    /// Time since the run started.
    pub elapsed: Duration,
    pub index: usize,
    /// Client side latency, from connect until the server closed the connection.
    pub latency: Duration,
    pub outcome: RequestOutcome,
}
