//! End-to-end tests of the customers admin API over real sockets.

use std::net::SocketAddr;

use customers_admin::config::schema::FallbackKind;
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_customer_crud_over_http() {
    let addr: SocketAddr = "127.0.0.1:28201".parse().unwrap();
    let shutdown = common::start_server(common::test_config(addr)).await;
    let client = common::client();
    let base = format!("http://{}/api/customers", addr);

    let res = client
        .post(&base)
        .json(&json!({ "nombre": "Ana", "email_contacto": "ana@example.com" }))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert!(res.headers().contains_key("x-request-id"));
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let listed: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["nombre"], "Ana");

    let res = client
        .put(format!("{}/{}", base, id))
        .json(&json!({ "nombre": "Ana Ruiz", "email_contacto": "ana@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let fetched: Value = client
        .get(format!("{}/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["nombre"], "Ana Ruiz");

    let res = client.delete(format!("{}/{}", base, id)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await.unwrap().is_empty());

    let res = client.get(format!("{}/{}", base, id)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn test_preflight_and_unknown_routes() {
    let addr: SocketAddr = "127.0.0.1:28202".parse().unwrap();
    let shutdown = common::start_server(common::test_config(addr)).await;
    let client = common::client();

    let res = client
        .request(reqwest::Method::OPTIONS, format!("http://{}/api/customers/7", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["access-control-allow-methods"],
        "GET, POST, PUT, DELETE, OPTIONS"
    );
    assert_eq!(res.headers()["access-control-allow-headers"], "Content-Type");
    assert!(res.bytes().await.unwrap().is_empty());

    let res = client
        .get(format!("http://{}/api/nada", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Ruta no encontrada" }));

    let res = client
        .get(format!("http://{}/panel", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");

    shutdown.trigger();
}

#[tokio::test]
async fn test_debug_endpoint_reports_environment() {
    let addr: SocketAddr = "127.0.0.1:28203".parse().unwrap();
    let shutdown = common::start_server(common::test_config(addr)).await;

    let body: Value = common::client()
        .get(format!("http://{}/api/debug", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["environment"], "test");
    assert_eq!(body["request"]["method"], "GET");

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let addr: SocketAddr = "127.0.0.1:28204".parse().unwrap();
    let shutdown = common::start_server(common::test_config(addr)).await;

    let res = common::client()
        .get(format!("http://{}/api/customers", addr))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let addr: SocketAddr = "127.0.0.1:28205".parse().unwrap();
    let mut config = common::test_config(addr);
    config.security.max_body_size = 64;
    let shutdown = common::start_server(config).await;

    let res = common::client()
        .post(format!("http://{}/api/customers", addr))
        .header("content-type", "application/json")
        .body("x".repeat(1024))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unrouted_paths_go_to_upstream() {
    let origin: SocketAddr = "127.0.0.1:28206".parse().unwrap();
    let addr: SocketAddr = "127.0.0.1:28207".parse().unwrap();
    common::start_mock_backend(origin, "<html>panel</html>").await;

    let mut config = common::test_config(addr);
    config.fallback.kind = FallbackKind::Network;
    config.fallback.upstream = Some(format!("http://{}", origin));
    let shutdown = common::start_server(config).await;

    let res = common::client()
        .get(format!("http://{}/panel/index.html", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.text().await.unwrap(), "<html>panel</html>");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let addr: SocketAddr = "127.0.0.1:28208".parse().unwrap();
    let mut config = common::test_config(addr);
    config.fallback.kind = FallbackKind::Network;
    // Nothing listens here.
    config.fallback.upstream = Some("http://127.0.0.1:28209".to_string());
    let shutdown = common::start_server(config).await;

    let res = common::client()
        .get(format!("http://{}/panel", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed() {
    let origin: SocketAddr = "127.0.0.1:28210".parse().unwrap();
    let addr: SocketAddr = "127.0.0.1:28211".parse().unwrap();
    common::start_programmable_backend(origin, || async { (503, "mantenimiento".to_string()) })
        .await;

    let mut config = common::test_config(addr);
    config.fallback.kind = FallbackKind::Network;
    config.fallback.upstream = Some(format!("http://{}", origin));
    let shutdown = common::start_server(config).await;

    let res = common::client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "mantenimiento");

    shutdown.trigger();
}
