use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use rama::{
    error::BoxError, graceful::ShutdownGuard, net::address::SocketAddress, telemetry::tracing,
};

use clap::Args;
use diskio_sim_lib::utils::env;
use tokio::{
    sync::{
        Semaphore,
        mpsc::{self, Receiver, Sender},
    },
    time::Instant,
};

pub mod batch;
pub mod client;
pub mod reporter;

use self::{batch::RequestBatch, client::ClientOutcome, reporter::*};

#[derive(Debug, Clone, Args)]
/// run load against a sim server
pub struct RunCommand {
    /// socket address of the sim server
    #[arg(value_name = "ADDRESS", required = true)]
    target: SocketAddress,

    /// report json instead of a human-friendly format
    #[arg(long, default_value_t = false)]
    json: bool,

    /// amount of times the batch of requests is sent
    #[arg(long, short = 'i', default_value_t = 1)]
    iterations: usize,

    /// file with one request line per line, sent as the batch of every iteration
    #[arg(long, value_name = "PATH")]
    file_list: Option<PathBuf>,

    /// amount of requests per iteration, ignored when a file list is given
    #[arg(long, short = 'n', default_value_t = 1000)]
    requests: usize,

    /// max requests in flight (0 = MAX_CONCURRENT_REQUESTS or derived from CPU count)
    #[arg(long, short = 'c', default_value_t = 0)]
    concurrency: usize,

    /// seconds after which a request without response counts as a client timeout
    #[arg(long, value_name = "SECONDS", default_value_t = 5.)]
    client_timeout: f64,

    /// file path sent in every request, ignored when a file list is given
    #[arg(long, default_value = "file.txt")]
    file: String,

    /// predetermined service time sent along with every request,
    /// ignored when a file list is given
    #[arg(long, value_name = "MS")]
    elapsed_ms: Option<u64>,
}

pub async fn exec(guard: ShutdownGuard, args: RunCommand) -> Result<(), BoxError> {
    if args.client_timeout.is_nan() || args.client_timeout <= 0. {
        return Err(BoxError::from("client timeout has to be a positive amount of seconds"));
    }
    let client_timeout = Duration::from_secs_f64(args.client_timeout);

    let concurrency = if args.concurrency == 0 {
        env::compute_concurrent_request_count()
    } else {
        args.concurrency
    };

    let batch = match args.file_list.as_deref() {
        Some(path) => RequestBatch::from_file_list(path).await?,
        None => RequestBatch::repeat(
            client::request_line(&args.file, args.elapsed_ms),
            args.requests,
        ),
    };

    tracing::info!(
        server.address = %args.target,
        iterations = args.iterations,
        batch_size = batch.len(),
        concurrency,
        ?client_timeout,
        "client config parameters ready",
    );

    const REPORT_INTERVAL: Duration = Duration::from_secs(1);

    let reporter: Box<dyn Reporter> = if args.json {
        const EMIT_EVENTS: bool = true;
        Box::new(JsonlReporter::new(REPORT_INTERVAL, EMIT_EVENTS))
    } else {
        Box::new(HumanReporter::new(REPORT_INTERVAL))
    };

    let launch = Launch {
        target: SocketAddr::new(args.target.ip_addr, args.target.port),
        batch,
        iterations: args.iterations,
        client_timeout,
        concurrency: Arc::new(Semaphore::new(concurrency.max(1))),
    };

    let totals = run(guard, launch, reporter, REPORT_INTERVAL).await;
    tracing::info!(
        total = totals.total,
        client_timeout = totals.client_timeout,
        transport_fail = totals.transport_fail,
        "bench run finished"
    );
    Ok(())
}

struct Launch {
    target: SocketAddr,
    batch: RequestBatch,
    iterations: usize,
    client_timeout: Duration,
    concurrency: Arc<Semaphore>,
}

struct ClientResult {
    outcome: ClientOutcome,
    req_start: Instant,
    index: usize,
}

/// Send every iteration of the batch and report until all results are in,
/// returning the totals over the whole run.
async fn run(
    guard: ShutdownGuard,
    launch: Launch,
    reporter: Box<dyn Reporter>,
    interval: Duration,
) -> Counters {
    let (result_tx, result_rx) = mpsc::channel(launch.concurrency.available_permits().max(1) * 8);
    guard.spawn_task_fn(|guard| launch_worker(guard, launch, result_tx));
    report_worker(guard, reporter, result_rx, interval).await
}

async fn launch_worker(guard: ShutdownGuard, launch: Launch, result_tx: Sender<ClientResult>) {
    let mut cancelled = std::pin::pin!(guard.clone_weak().into_cancelled());
    let batch_size = launch.batch.len();

    for iteration in 0..launch.iterations {
        let iteration_start = Instant::now();
        let (batch_done_tx, mut batch_done_rx) = mpsc::channel::<()>(1);

        for (offset, line) in launch.batch.iter().enumerate() {
            let index = iteration * batch_size + offset;
            let target = launch.target;
            let line = line.clone();
            let client_timeout = launch.client_timeout;
            let concurrency = launch.concurrency.clone();
            let result_tx = result_tx.clone();
            let batch_done_tx = batch_done_tx.clone();

            guard.spawn_task_fn(async move |guard| {
                let _batch_done_tx = batch_done_tx;
                let _permit = tokio::select! {
                    _ = guard.cancelled() => {
                        tracing::error!("cancel wait for concurrency: guard shutdown");
                        return;
                    }
                    permit = concurrency.acquire() => {
                        match permit {
                            Ok(permit) => permit,
                            Err(err) => {
                                tracing::error!("concurrency semaphore closed: {err}");
                                return;
                            }
                        }
                    }
                };

                let req_start = Instant::now();
                let outcome = client::send_request(target, &line, client_timeout).await;
                if let Err(err) = result_tx
                    .send(ClientResult {
                        outcome,
                        req_start,
                        index,
                    })
                    .await
                {
                    tracing::debug!("failed to send client result msg: {err}");
                }
            });
        }
        drop(batch_done_tx);

        // resolves once every request of this iteration dropped its sender
        tokio::select! {
            _ = cancelled.as_mut() => {
                tracing::error!("exit bench runner early: guard shutdown");
                return;
            }
            _ = batch_done_rx.recv() => {}
        }

        let elapsed = iteration_start.elapsed();
        if elapsed > launch.client_timeout {
            tracing::warn!(iteration, ?elapsed, "***client timeout: iteration took too long");
        } else {
            tracing::debug!(iteration, ?elapsed, "iteration finished");
        }
    }

    tracing::debug!(
        "all {} iterations of {batch_size} requests finished",
        launch.iterations
    );
}

async fn report_worker(
    guard: ShutdownGuard,
    mut reporter: Box<dyn Reporter>,
    mut result_rx: Receiver<ClientResult>,
    interval: Duration,
) -> Counters {
    let start = Instant::now();
    let mut ticker = tokio::time::interval(interval);

    loop {
        let ClientResult {
            outcome,
            req_start,
            index,
        } = tokio::select! {
            _ = guard.cancelled() => {
                tracing::debug!("exit report worker: guard shutdown");
                break;
            }

            _ = ticker.tick() => {
                reporter.on_tick(start.elapsed());
                continue;
            }

            maybe_result = result_rx.recv() => {
                let Some(result) = maybe_result else {
                    tracing::debug!("exit report worker: all requests finished");
                    break;
                };

                result
            }
        };

        let outcome = match outcome {
            ClientOutcome::Response(resp) => RequestOutcome::Response {
                status: resp.status,
                bytes_read: resp.bytes_read,
                total_elapsed_ms: resp.total_elapsed_ms,
            },
            ClientOutcome::Timeout => RequestOutcome::ClientTimeout,
            ClientOutcome::TransportFailure(err) => {
                tracing::debug!("transport failure: {err}");
                RequestOutcome::TransportFailure
            }
        };

        reporter.on_result(&RequestResultEvent {
            elapsed: start.elapsed(),
            index,
            latency: req_start.elapsed(),
            outcome,
        });
    }

    reporter.on_tick(start.elapsed());
    reporter.finish();
    reporter.total_counts().clone()
}
