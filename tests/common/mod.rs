//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use largeheaders::config::{LargeHeadersConfig, SharedConfig, ThresholdConfig};
use largeheaders::config::schema::UpstreamConfig;
use largeheaders::config::watcher::ConfigReload;
use largeheaders::{HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Start a mock upstream that answers every request with `headers` (raw
/// `Name: value` lines, no trailing CRLF) and `body`.
pub async fn start_mock_backend(headers: String, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let headers = headers.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\n{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            headers,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A fresh directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("largeheaders-{}-{}", label, Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Config pointing at `upstream`, logging into `log_dir`, with the
/// 100 / 10000 / 30 thresholds.
pub fn test_config(upstream: Option<SocketAddr>, log_dir: &PathBuf) -> LargeHeadersConfig {
    let mut config = LargeHeadersConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream = upstream.map(|addr| UpstreamConfig {
        address: addr.to_string(),
    });
    config.thresholds = ThresholdConfig {
        length_threshold: 100,
        total_data_threshold: 10_000,
        num_headers_threshold: 30,
    };
    config.log.directory = Some(log_dir.display().to_string());
    config
}

/// Start the inspected server; returns its address and the shutdown handle.
pub async fn start_server(config: LargeHeadersConfig) -> (SocketAddr, Shutdown) {
    let (_, config_updates) = mpsc::unbounded_channel();
    let (addr, shutdown, _) = start_server_with_reloads(config, config_updates).await;
    (addr, shutdown)
}

/// Start the inspected server fed by `config_updates`; also returns the live
/// config it reads.
pub async fn start_server_with_reloads(
    config: LargeHeadersConfig,
    config_updates: mpsc::UnboundedReceiver<ConfigReload>,
) -> (SocketAddr, Shutdown, SharedConfig) {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(SharedConfig::new(config));
    let live = server.config().clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown, live)
}

/// Poll `check` until it holds, failing the test after ten seconds.
pub async fn eventually(what: &str, check: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !check() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
