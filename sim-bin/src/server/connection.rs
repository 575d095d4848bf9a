use std::convert::Infallible;

use rama::{
    Service,
    error::{BoxError, ErrorContext as _},
    stream::Stream,
    telemetry::tracing,
};
use tokio::{
    io::{AsyncBufReadExt as _, AsyncRead, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _, BufReader},
    time::Instant,
};

use diskio_sim_lib::{sim::Simulator, wire::Request};

/// Upper bound of bytes read for a single request line.
/// Anything beyond is not read and the line is served truncated.
pub const MAX_REQUEST_LINE_BYTES: u64 = 4096;

/// Serves one simulated read per accepted connection.
#[derive(Debug, Clone)]
pub struct DiskIoService {
    simulator: Simulator,
}

impl DiskIoService {
    pub fn new(simulator: Simulator) -> Self {
        Self { simulator }
    }
}

impl<T> Service<T> for DiskIoService
where
    T: Stream + Unpin,
{
    type Output = ();
    type Error = Infallible;

    async fn serve(&self, stream: T) -> Result<Self::Output, Self::Error> {
        // first poll of the per-connection task, before anything is read
        let receipt_time = Instant::now();
        if let Err(err) = serve_connection(&self.simulator, stream, receipt_time).await {
            tracing::warn!("connection aborted: {err}");
        }
        Ok(())
    }
}

/// Read a single request line, simulate the read, write the response and close.
///
/// A client that closes without sending anything gets no response.
pub async fn serve_connection<S>(
    simulator: &Simulator,
    stream: S,
    receipt_time: Instant,
) -> Result<(), BoxError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(stream);

    let mut raw_line = Vec::new();
    let n = (&mut reader)
        .take(MAX_REQUEST_LINE_BYTES)
        .read_until(b'\n', &mut raw_line)
        .await
        .context("read request line")?;
    if n == 0 {
        tracing::debug!("client closed connection before sending a request");
        return Ok(());
    }

    let request = Request::parse(&String::from_utf8_lossy(&raw_line), receipt_time);
    let response = simulator.handle(&request).await;

    let mut stream = reader.into_inner();
    stream
        .write_all(response.to_string().as_bytes())
        .await
        .context("write response")?;
    stream.shutdown().await.context("close connection")?;

    Ok(())
}
