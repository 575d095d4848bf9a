use std::time::Duration;

use diskio_sim_lib::sim::ReadStatus;

use super::{Counters, Reporter, RequestResultEvent};

pub struct HumanReporter {
    interval: Duration,
    last_tick: Duration,
    interval_counts: Counters,
    total_counts: Counters,
    last_index: Option<usize>,
}

impl HumanReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: Duration::ZERO,
            interval_counts: Counters::default(),
            total_counts: Counters::default(),
            last_index: None,
        }
    }

    fn format_counts(c: &Counters) -> String {
        format!(
            "ok={} read_timeout={} io_fail={} queue_timeout={} client_timeout={} transport_fail={} latency_mean={:?} latency_max={:?}",
            c.count(ReadStatus::Success),
            c.count(ReadStatus::ReadTimeout),
            c.count(ReadStatus::IoFailure),
            c.count(ReadStatus::QueueTimeout),
            c.client_timeout,
            c.transport_fail,
            c.latency_mean(),
            c.latency_max(),
        )
    }
}

impl Reporter for HumanReporter {
    fn on_result(&mut self, ev: &RequestResultEvent) {
        self.interval_counts.apply(ev);
        self.total_counts.apply(ev);
        self.last_index = Some(ev.index);
    }

    fn on_tick(&mut self, now: Duration) {
        if now.saturating_sub(self.last_tick) < self.interval {
            return;
        }
        let interval_secs = now.saturating_sub(self.last_tick).as_secs_f64();
        self.last_tick = now;

        let rps = self.interval_counts.total as f64 / interval_secs;

        println!(
            "t={:.1}s idx={} rps={:.1} {} total={}",
            now.as_secs_f64(),
            self.last_index.unwrap_or_default(),
            rps,
            Self::format_counts(&self.interval_counts),
            self.total_counts.total,
        );

        self.interval_counts = Counters::default();
    }

    fn finish(&mut self) {
        println!(
            "done {} total={}",
            Self::format_counts(&self.total_counts),
            self.total_counts.total,
        );
    }

    fn total_counts(&self) -> &Counters {
        &self.total_counts
    }
}
