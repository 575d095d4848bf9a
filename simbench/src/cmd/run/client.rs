use std::{net::SocketAddr, time::Duration};

use rama::{
    error::{BoxError, ErrorContext as _},
    telemetry::tracing,
};
use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    net::TcpStream,
};

use diskio_sim_lib::wire::ReadResponse;

/// What came of a single request, as seen by the client.
#[derive(Debug)]
pub enum ClientOutcome {
    Response(ReadResponse),
    /// No complete response within the client timeout.
    Timeout,
    /// Connect, write or read failed, or the response could not be decoded.
    TransportFailure(BoxError),
}

/// Build the request line for the given file and optional service time.
pub fn request_line(file_path: &str, elapsed_ms: Option<u64>) -> String {
    match elapsed_ms {
        Some(ms) => format!("{ms},{file_path}\n"),
        None => format!("{file_path}\n"),
    }
}

/// Send one request line over a fresh connection and wait for the server to close it.
pub async fn send_request(target: SocketAddr, line: &str, timeout: Duration) -> ClientOutcome {
    match tokio::time::timeout(timeout, exchange(target, line)).await {
        Err(_) => {
            tracing::debug!(server.address = %target, "***client timeout");
            ClientOutcome::Timeout
        }
        Ok(Err(err)) => ClientOutcome::TransportFailure(err),
        Ok(Ok(resp)) => ClientOutcome::Response(resp),
    }
}

async fn exchange(target: SocketAddr, line: &str) -> Result<ReadResponse, BoxError> {
    let mut stream = TcpStream::connect(target)
        .await
        .context("connect to sim server")?;
    stream
        .write_all(line.as_bytes())
        .await
        .context("write request line")?;

    let mut raw = String::new();
    stream
        .read_to_string(&mut raw)
        .await
        .context("read response")?;

    let resp = raw
        .parse::<ReadResponse>()
        .with_context(|| format!("decode response '{raw}'"))?;
    Ok(resp)
}
