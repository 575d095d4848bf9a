use std::{
    io::ErrorKind,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::Duration,
};

use clap::Parser;
use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    net::TcpStream,
    sync::OnceCell,
};

use diskio_sim_lib::wire::ReadResponse;

use crate::Args;

#[derive(Debug, Clone)]
pub(super) struct Runtime {
    server_addr: SocketAddr,
    http_server_addr: SocketAddr,
}

impl Runtime {
    #[inline(always)]
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    #[inline(always)]
    pub fn http_server_addr(&self) -> SocketAddr {
        self.http_server_addr
    }

    /// Send a single raw request and return whatever the server wrote back.
    pub async fn send_raw(&self, raw: &[u8]) -> String {
        send_raw_to(self.server_addr, raw).await
    }

    pub async fn request(&self, line: &str) -> ReadResponse {
        let raw = self.send_raw(format!("{line}\n").as_bytes()).await;
        raw.parse()
            .unwrap_or_else(|err| panic!("invalid response {raw:?}: {err}"))
    }

    /// Send a raw `GET` for the given path to the HTTP front-end
    /// and return the raw response, read until the server closes.
    pub async fn http_get(&self, path: &str) -> String {
        let raw = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n");
        send_raw_to(self.http_server_addr, raw.as_bytes()).await
    }
}

async fn send_raw_to(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut buf = String::new();
    tokio::time::timeout(Duration::from_secs(30), stream.read_to_string(&mut buf))
        .await
        .expect("response within 30s")
        .unwrap();
    buf
}

/// Shared server for all e2e tests, spawned once on its own thread.
pub(super) async fn get() -> Runtime {
    static RUNTIME: OnceCell<Runtime> = OnceCell::const_new();
    RUNTIME.get_or_init(spawn).await.clone()
}

async fn spawn() -> Runtime {
    let data_dir = spawn_diskio_sim_app();

    let server_addr = tokio::time::timeout(
        Duration::from_secs(60),
        read_file_or_wait(data_dir.join("diskio-sim.addr.txt")),
    )
    .await
    .unwrap();

    let http_server_addr = tokio::time::timeout(
        Duration::from_secs(60),
        read_file_or_wait(data_dir.join("diskio-sim.http.addr.txt")),
    )
    .await
    .unwrap();

    Runtime {
        server_addr,
        http_server_addr,
    }
}

async fn read_file_or_wait(path: PathBuf) -> SocketAddr {
    loop {
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => {
                let s = s.trim();
                if s.is_empty() {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
                match s.parse() {
                    Ok(addr) => return addr,
                    Err(err) => {
                        eprintln!("unexpected error parsing socket addr (content={s:?}): {err}");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        continue;
                    }
                }
            }
            Err(err) => {
                if err.kind() == ErrorKind::NotFound {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                } else {
                    panic!("unexpected error: {err}");
                }
            }
        }
    }
}

fn spawn_diskio_sim_app() -> PathBuf {
    let data_dir = crate::test::tmp_dir::try_new("diskio_sim_app_e2e").unwrap();
    eprintln!("diskio_sim_app_e2e all data stored under: {data_dir:?}");

    let data_dir_str = data_dir.display().to_string();

    let argv: Vec<&str> = vec![
        "diskio-sim",
        "--bind",
        "127.0.0.1:0",
        "--http-bind",
        "127.0.0.1:0",
        "--data",
        &data_dir_str,
        "--graceful",
        "0.42",
        "--seed",
        "42",
    ];

    let args = Args::try_parse_from(argv).unwrap();

    let wait_server_ready = Arc::new(OnceLock::new());
    let notify_server_ready = wait_server_ready.clone();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();

        let server_future = crate::run_with_args(std::future::pending::<()>(), args);

        notify_server_ready.set(()).expect("waiter to be notified");

        rt.block_on(server_future).expect("serve without errors");
    });

    wait_server_ready.wait();

    data_dir
}
