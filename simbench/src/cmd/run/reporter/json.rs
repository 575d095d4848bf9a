use std::time::Duration;

use super::{Counters, Reporter, RequestOutcome, RequestResultEvent};

pub struct JsonlReporter {
    interval: Duration,
    last_tick: Duration,
    interval_counts: Counters,
    total_counts: Counters,
    emit_events: bool,
}

impl JsonlReporter {
    pub fn new(interval: Duration, emit_events: bool) -> Self {
        Self {
            interval,
            last_tick: Duration::ZERO,
            interval_counts: Counters::default(),
            total_counts: Counters::default(),
            emit_events,
        }
    }

    fn event_line(ev: &RequestResultEvent) -> serde_json::Value {
        let (kind, status, bytes_read, total_elapsed_ms) = match ev.outcome {
            RequestOutcome::Response {
                status,
                bytes_read,
                total_elapsed_ms,
            } => (
                "response",
                Some(status.code()),
                Some(bytes_read),
                Some(total_elapsed_ms),
            ),
            RequestOutcome::ClientTimeout => ("client_timeout", None, None, None),
            RequestOutcome::TransportFailure => ("transport_fail", None, None, None),
        };

        serde_json::json!({
            "type": "event",
            "t_ms": ev.elapsed.as_millis(),
            "index": ev.index,
            "latency_ms": ev.latency.as_millis(),
            "outcome": kind,
            "status": status,
            "bytes_read": bytes_read,
            "total_elapsed_ms": total_elapsed_ms,
        })
    }
}

impl Reporter for JsonlReporter {
    fn on_result(&mut self, ev: &RequestResultEvent) {
        self.interval_counts.apply(ev);
        self.total_counts.apply(ev);

        if self.emit_events {
            println!("{}", Self::event_line(ev));
        }
    }

    fn on_tick(&mut self, now: Duration) {
        if now.saturating_sub(self.last_tick) < self.interval {
            return;
        }
        let interval_secs = now.saturating_sub(self.last_tick).as_secs_f64();
        self.last_tick = now;

        let rps = self.interval_counts.total as f64 / interval_secs;

        let line = serde_json::json!({
            "type": "summary",
            "t_ms": now.as_millis(),
            "interval_ms": self.interval.as_millis(),
            "rps": rps,
            "interval": self.interval_counts.to_json(),
            "total": self.total_counts.to_json(),
        });
        println!("{line}");

        self.interval_counts = Counters::default();
    }

    fn finish(&mut self) {
        let line = serde_json::json!({
            "type": "final",
            "total": self.total_counts.to_json(),
        });
        println!("{line}");
    }

    fn total_counts(&self) -> &Counters {
        &self.total_counts
    }
}
