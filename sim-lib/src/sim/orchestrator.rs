use std::sync::Arc;

use rama::telemetry::tracing;
use tokio::time::Instant;

use crate::{
    config::SimulationConfig,
    wire::{ReadResponse, Request},
};

use super::{
    elapsed::{plan_read, simulate_read},
    queue::QueueWait,
    random::{VariateSource, VariateStream},
    result::ReadResult,
};

/// Runs the decision sequence of a single request:
/// queue check, classification, simulated read and timeout reconciliation.
///
/// Cheap to clone, all clones share the same config and variate source.
#[derive(Debug, Clone)]
pub struct Simulator(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    cfg: SimulationConfig,
    source: VariateSource,
}

impl Simulator {
    pub fn new(cfg: SimulationConfig) -> Self {
        let source = VariateSource::new(cfg.seed);
        Self(Arc::new(Inner { cfg, source }))
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.0.cfg
    }

    pub fn variate_source(&self) -> &VariateSource {
        &self.0.source
    }

    /// Serve a request, drawing from the next stream of the shared source.
    pub async fn handle(&self, request: &Request) -> ReadResponse {
        let stream = self.0.source.next_stream();
        self.handle_with_stream(request, stream).await
    }

    /// Serve a request using an explicit variate stream.
    ///
    /// Once the simulated read has started it always runs to completion,
    /// whether or not anyone is still waiting for the answer.
    pub async fn handle_with_stream(
        &self,
        request: &Request,
        mut stream: VariateStream,
    ) -> ReadResponse {
        let cfg = &self.0.cfg;

        let queue = QueueWait::evaluate(request.receipt_time, Instant::now(), cfg);
        if queue.timed_out {
            tracing::debug!(
                file.path = %request.file_path,
                queue_wait_ms = queue.wait_ms,
                "timeout (queue)"
            );
            return ReadResponse::new(
                ReadResult::queue_timeout(),
                queue.wait_ms,
                request.file_path.as_str(),
            );
        }

        let plan = plan_read(request.predetermined_elapsed_ms(), &mut stream, cfg);
        tracing::trace!(
            file.path = %request.file_path,
            stream = stream.discriminator(),
            outcome = ?request.outcome,
            class = ?plan.class,
            planned_ms = plan.result.elapsed_ms,
            "read planned"
        );

        let result = simulate_read(plan, &request.file_path, cfg).await;
        tracing::debug!(
            file.path = %request.file_path,
            status = %result.status,
            bytes_read = result.bytes_read,
            elapsed_ms = result.elapsed_ms,
            queue_wait_ms = queue.wait_ms,
            "read completed"
        );

        ReadResponse::new(result, queue.wait_ms, request.file_path.as_str())
    }
}
