//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use customers_admin::config::schema::FallbackKind;
use customers_admin::config::AppConfig;
use customers_admin::lifecycle::startup;
use customers_admin::Shutdown;

/// Configuration for a test server: in-memory database, 404 fallback.
pub fn test_config(addr: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = "test".to_string();
    config.listener.bind_address = addr.to_string();
    config.database.url = "sqlite::memory:".to_string();
    config.fallback.kind = FallbackKind::NotFound;
    config.timeouts.shutdown_grace_secs = 1;
    config
}

/// Start the full service on `config.listener.bind_address`. Trigger the
/// returned handle to stop it.
pub async fn start_server(config: AppConfig) -> Arc<Shutdown> {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = Arc::clone(&shutdown);

    tokio::spawn(async move {
        if let Err(e) = startup::serve(&config, listener, server_shutdown).await {
            eprintln!("test server failed: {e}");
        }
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

/// Non-pooled client so each test sees fresh connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a simple mock backend that returns a fixed response.
pub async fn start_mock_backend(addr: SocketAddr, response: &'static str) {
    start_programmable_backend(addr, move || async move { (200, response.to_string()) }).await;
}

/// Start a programmable mock backend with async support.
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
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
}
