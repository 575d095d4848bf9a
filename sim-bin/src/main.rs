#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

use std::{path::PathBuf, time::Duration};

use rama::{
    error::{BoxError, ErrorContext as _},
    graceful,
    net::socket::Interface,
    telemetry::tracing::{self, Instrument as _},
};

use clap::Parser;

use diskio_sim_lib::{
    config::{SimulationArgs, SimulationConfig},
    sim::Simulator,
    utils,
};

pub mod server;

#[cfg(target_family = "unix")]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[cfg(target_os = "windows")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(test)]
mod test;

/// CLI arguments for configuring the simulated disk IO server.
#[derive(Debug, Clone, Parser)]
#[command(name = "diskio-sim")]
#[command(bin_name = "diskio-sim")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// network interface to bind the server to
    #[arg(
        long,
        short = 'b',
        value_name = "INTERFACE",
        default_value = "0.0.0.0:6000"
    )]
    pub bind: Interface,

    /// network interface to bind the HTTP front-end to, disabled if not set
    #[arg(long, value_name = "INTERFACE")]
    pub http_bind: Option<Interface>,

    /// debug logging as default instead of Info; use RUST_LOG env for more options
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,

    /// enable pretty logging (format for humans)
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// write the tracing output to the provided (log) file instead of stderr
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// directory in which the bound server address is written
    #[arg(long, short = 'D')]
    pub data: Option<PathBuf>,

    #[arg(long, value_name = "SECONDS", default_value_t = 25.)]
    /// the graceful shutdown timeout (<= 0.0 = no timeout)
    pub graceful: f64,

    #[cfg(target_family = "unix")]
    /// Set the limit of max open file descriptors for this process and its children.
    #[arg(long, value_name = "N", default_value_t = 262_144)]
    pub ulimit: utils::os::rlim_t,

    #[clap(flatten)]
    pub simulation: SimulationArgs,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();

    utils::telemetry::init_tracing(utils::telemetry::TelemetryConfig {
        verbose: args.verbose,
        pretty: args.pretty,
        output: args.output.as_deref(),
    })?;

    #[cfg(target_family = "unix")]
    utils::os::raise_nofile(args.ulimit).context("set file descriptor limit")?;

    let base_shutdown_signal = graceful::default_signal();
    if let Err(err) = run_with_args(base_shutdown_signal, args).await {
        eprintln!("🚩 exit with error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

/// Runs the simulation server and blocks until
/// a critical error occurs or the (graceful) shutdown has been initiated.
///
/// Used by both the (binary) `main` function and the e2e tests.
async fn run_with_args<F>(base_shutdown_signal: F, args: Args) -> Result<(), BoxError>
where
    F: Future<Output: Send + 'static> + Send + 'static,
{
    let cfg = args
        .simulation
        .clone()
        .try_into_config(SimulationConfig::default())
        .context("prepare simulation config")?;
    tracing::info!(
        read_timeout_secs = cfg.read_timeout_secs,
        p_io_fail = cfg.p_io_fail,
        p_slow_read = cfg.p_slow_read,
        seed = cfg.seed,
        "simulation config ready"
    );
    let simulator = Simulator::new(cfg);

    if let Some(data) = args.data.as_deref() {
        tokio::fs::create_dir_all(data)
            .await
            .context("create data directory")?;
    }

    let graceful_timeout = (args.graceful > 0.).then(|| Duration::from_secs_f64(args.graceful));

    let (error_tx, error_rx) = tokio::sync::mpsc::channel::<BoxError>(1);
    let graceful = graceful::Shutdown::new(new_shutdown_signal(error_rx, base_shutdown_signal));

    if let Some(http_bind) = args.http_bind.clone() {
        let data = args.data.clone();
        let simulator = simulator.clone();
        let error_tx = error_tx.clone();
        graceful.spawn_task_fn(async move |guard| {
            tracing::info!("spawning simulated disk io http server...");
            if let Err(err) =
                server::run_http_sim_server(http_bind, data.as_deref(), guard, simulator)
                    .instrument(tracing::debug_span!(
                        "http sim server lifetime",
                        server.service.name = "diskio-sim",
                        otel.kind = "server",
                        network.protocol.name = "http",
                    ))
                    .await
            {
                tracing::error!("http sim server exited with an error: {err}");
                let _ = error_tx.send(err).await;
            }
        });
    }

    graceful.spawn_task_fn(async move |guard| {
        tracing::info!("spawning simulated disk io server...");
        if let Err(err) = server::run_sim_server(args, guard, simulator)
            .instrument(tracing::debug_span!(
                "sim server lifetime",
                server.service.name = "diskio-sim",
                otel.kind = "server",
                network.protocol.name = "tcp",
            ))
            .await
        {
            tracing::error!("sim server exited with an error: {err}");
            let _ = error_tx.send(err).await;
        }
    });

    let delay = match graceful_timeout {
        Some(duration) => graceful.shutdown_with_limit(duration).await?,
        None => graceful.shutdown().await,
    };

    tracing::info!("gracefully shutdown with a delay of: {delay:?}");
    Ok(())
}

fn new_shutdown_signal(
    error_rx: tokio::sync::mpsc::Receiver<BoxError>,
    base_shutdown_signal: impl Future<Output: Send + 'static> + Send + 'static,
) -> impl Future + Send + 'static {
    async move {
        let mut mut_error_rx = error_rx;
        let mut signal = Box::pin(base_shutdown_signal);

        tokio::select! {
            _ = signal.as_mut() => {
                tracing::debug!("default signal triggered: init graceful shutdown");
            }
            err = mut_error_rx.recv() => {
                if let Some(err) = err {
                    tracing::error!("fatal err received: {err}; abort");
                } else {
                    tracing::info!("wait for default signal, no error was received");
                    signal.await;
                    tracing::debug!("default signal triggered: init graceful shutdown");
                }
            }
        }
    }
}
