use std::path::Path;

use rama::{
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    net::address::SocketAddress,
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};

use diskio_sim_lib::sim::Simulator;

use crate::Args;

mod connection;
mod http;

pub use self::{
    connection::{DiskIoService, MAX_REQUEST_LINE_BYTES, serve_connection},
    http::{HTTP_SERVER_NAME, HttpDiskIoService, run_http_sim_server},
};

/// Runs the simulated disk IO server.
///
/// Every accepted connection is served on its own task,
/// there is no limit on how many are in flight.
pub async fn run_sim_server(
    args: Args,
    guard: ShutdownGuard,
    simulator: Simulator,
) -> Result<(), BoxError> {
    let exec = Executor::graceful(guard);

    let tcp_listener = TcpListener::build(exec)
        .bind(args.bind)
        .await
        .context("bind TCP network interface for sim server")?;

    let server_addr = tcp_listener
        .local_addr()
        .context("fetch local addr of bound TCP port for sim server")?;

    tracing::info!(server.address = %server_addr, "simulated disk io server ready");
    if let Some(data) = args.data.as_deref() {
        write_server_socket_address_as_file(data, "diskio-sim", server_addr.into()).await?;
    }

    tcp_listener.serve(DiskIoService::new(simulator)).await;

    Ok(())
}

async fn write_server_socket_address_as_file(
    dir: &Path,
    name: &str,
    addr: SocketAddress,
) -> Result<(), BoxError> {
    let path = dir.join(format!("{name}.addr.txt"));
    tokio::fs::write(&path, addr.to_string())
        .await
        .with_context(|| {
            format!(
                "write socket address '{addr}' for server '{name}' to file '{}'",
                path.display()
            )
        })
}
