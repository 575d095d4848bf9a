use std::{convert::Infallible, sync::Arc};

use rama::{
    Layer as _, Service,
    error::{BoxError, ErrorContext as _},
    graceful::ShutdownGuard,
    http::{
        HeaderValue, Request, Response, StatusCode,
        header::CONNECTION,
        headers,
        layer::{required_header::AddRequiredResponseHeadersLayer, trace::TraceLayer},
        server::HttpServer,
        service::web::response::{Headers, IntoResponse as _},
    },
    net::socket::Interface,
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};
use tokio::time::Instant;

use diskio_sim_lib::{
    sim::{QueueWait, ReadStatus, Simulator},
    wire::{self, FIELD_DELIMITER, ParseOutcome},
};

/// Value of the `Server` header of every HTTP response.
pub const HTTP_SERVER_NAME: &str = "diskio-sim";

/// Runs the HTTP front-end of the simulated disk IO server,
/// sharing the [`Simulator`] of the line protocol server.
pub async fn run_http_sim_server(
    bind: Interface,
    data: Option<&std::path::Path>,
    guard: ShutdownGuard,
    simulator: Simulator,
) -> Result<(), BoxError> {
    let http_svc = (
        TraceLayer::new_for_http(),
        AddRequiredResponseHeadersLayer::new()
            .with_server_header_value(HeaderValue::from_static(HTTP_SERVER_NAME)),
    )
        .into_layer(HttpDiskIoService::new(simulator));

    let exec = Executor::graceful(guard);
    let http_server = HttpServer::auto(exec.clone()).service(Arc::new(http_svc));

    let tcp_listener = TcpListener::build(exec)
        .bind(bind)
        .await
        .context("bind TCP network interface for http sim server")?;

    let server_addr = tcp_listener
        .local_addr()
        .context("fetch local addr of bound TCP port for http sim server")?;

    tracing::info!(server.address = %server_addr, "simulated disk io http server ready");
    if let Some(data) = data {
        super::write_server_socket_address_as_file(data, "diskio-sim.http", server_addr.into())
            .await?;
    }

    tcp_listener.serve(http_server).await;

    Ok(())
}

/// Serves `GET /<rc>,<elapsed_ms>,<file_path>` requests.
///
/// The body of every response is `<total_elapsed_ms>,<file_path>`,
/// with an empty file path for requests that were not served.
#[derive(Debug, Clone)]
pub struct HttpDiskIoService {
    simulator: Simulator,
}

impl HttpDiskIoService {
    pub fn new(simulator: Simulator) -> Self {
        Self { simulator }
    }

    pub(crate) async fn respond(&self, path: &str, receipt_time: Instant) -> Response {
        let Some(args) = HttpReadArgs::parse(path) else {
            let queue = QueueWait::evaluate(receipt_time, Instant::now(), self.simulator.config());
            let status = if queue.timed_out {
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::debug!(http.path = path, "bad request");
                StatusCode::BAD_REQUEST
            };
            return text_response(status, queue.wait_ms, "");
        };
        tracing::trace!(
            http.return_code = args.return_code,
            file.path = %args.file_path,
            "http read request"
        );

        let request = wire::Request {
            receipt_time,
            outcome: ParseOutcome::Override(args.elapsed_ms),
            file_path: args.file_path,
        };
        let response = self.simulator.handle(&request).await;

        let status = match response.status {
            ReadStatus::Success => StatusCode::OK,
            ReadStatus::ReadTimeout | ReadStatus::QueueTimeout => StatusCode::REQUEST_TIMEOUT,
            ReadStatus::IoFailure => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let file_path = if response.status == ReadStatus::QueueTimeout {
            ""
        } else {
            response.file_path.as_str()
        };
        text_response(status, response.total_elapsed_ms, file_path)
    }
}

impl Service<Request> for HttpDiskIoService {
    type Output = Response;
    type Error = Infallible;

    async fn serve(&self, req: Request) -> Result<Self::Output, Self::Error> {
        let receipt_time = Instant::now();
        let path = req.uri().path().to_owned();
        Ok(self.respond(&path, receipt_time).await)
    }
}

fn text_response(status: StatusCode, total_elapsed_ms: u64, file_path: &str) -> Response {
    let mut resp = (
        status,
        Headers::single(headers::ContentType::text_utf8()),
        format!("{total_elapsed_ms}{FIELD_DELIMITER}{file_path}"),
    )
        .into_response();
    resp.headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
    resp
}

/// Arguments encoded in the path of an HTTP read request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HttpReadArgs {
    return_code: u32,
    elapsed_ms: u64,
    file_path: String,
}

impl HttpReadArgs {
    /// Parse `/<rc>,<elapsed_ms>,<file_path>`.
    ///
    /// The file path may not contain the delimiter,
    /// the return code has to be a positive integer.
    fn parse(path: &str) -> Option<Self> {
        let mut fields = path.trim_start_matches('/').split(FIELD_DELIMITER);
        let return_code: u32 = fields.next()?.trim().parse().ok()?;
        let elapsed_ms: u64 = fields.next()?.trim().parse().ok()?;
        let file_path = fields.next()?;
        if fields.next().is_some() || return_code == 0 {
            return None;
        }
        Some(Self {
            return_code,
            elapsed_ms,
            file_path: file_path.to_owned(),
        })
    }
}
