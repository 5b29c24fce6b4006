//! Shared harness for the integration tests.
//!
//! Everything binds to `127.0.0.1:0` so tests can run in parallel.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    Json, Router,
};
use bifrost_gateway::config::{GatewayConfig, RetryConfig};
use bifrost_gateway::lifecycle::{startup, Shutdown};
use bifrost_gateway::{GatewayClient, StubBackend};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// A request as seen by the echo backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct EchoBackend {
    pub seen: Arc<Mutex<Vec<Recorded>>>,
}

impl EchoBackend {
    pub fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }
}

async fn echo(State(echo): State<EchoBackend>, request: Request<Body>) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let bytes: Bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let recorded = Recorded {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };
    echo.seen.lock().unwrap().push(recorded.clone());
    ([("x-echo", "1")], Json(recorded))
}

/// Backend answering every request with a JSON description of it.
pub async fn start_echo_backend() -> (SocketAddr, EchoBackend) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let backend = EchoBackend::default();
    let app = Router::new().fallback(echo).with_state(backend.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, backend)
}

/// Backend that applies every request, then takes `delay` to answer.
#[derive(Clone)]
pub struct SlowBackend {
    pub delay: Duration,
    pub applied: Arc<AtomicUsize>,
}

impl SlowBackend {
    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }
}

async fn apply_then_stall(
    State(slow): State<SlowBackend>,
    request: Request<Body>,
) -> impl IntoResponse {
    slow.applied.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(slow.delay).await;
    let status = if request.method() == axum::http::Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(serde_json::json!({"name": "people", "items": []})))
}

pub async fn start_slow_backend(delay: Duration) -> (SocketAddr, SlowBackend) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let backend = SlowBackend {
        delay,
        applied: Arc::new(AtomicUsize::new(0)),
    };
    let app = Router::new()
        .fallback(apply_then_stall)
        .with_state(backend.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, backend)
}

/// In-memory stub backend on an ephemeral port.
pub async fn start_stub(stub: StubBackend) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        // Keep the sender alive for the life of the server task.
        let _shutdown = shutdown;
        stub.serve(listener, rx).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config pointing the gateway at `backend` with short timeouts.
pub fn gateway_config(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.address = backend.to_string();
    config.timeouts.connect_secs = 1;
    config.timeouts.request_secs = 5;
    config.retries = RetryConfig {
        base_delay_ms: 10,
        max_delay_ms: 50,
        ..RetryConfig::default()
    };
    config
}

/// Dev gateway in front of `backend`. Returns its address and shutdown handle.
pub async fn start_gateway(backend: SocketAddr) -> (SocketAddr, Shutdown) {
    start_gateway_with(gateway_config(backend)).await
}

pub async fn start_gateway_with(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = startup::prepare(&config).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let keep_alive = shutdown.clone();

    tokio::spawn(async move {
        let _keep_alive = keep_alive;
        server.run(listener, rx).await.unwrap();
    });
    (addr, shutdown)
}

pub fn url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

/// Contract client with fast retries.
pub fn client(addr: SocketAddr) -> GatewayClient {
    GatewayClient::new(&url(addr)).unwrap().with_retries(RetryConfig {
        base_delay_ms: 10,
        max_delay_ms: 50,
        ..RetryConfig::default()
    })
}

pub fn detection(label: &str, utc: &str) -> bifrost_gateway::gateway::types::Detection {
    bifrost_gateway::gateway::types::Detection {
        label: label.to_string(),
        bbox: serde_json::json!({"x": 1, "y": 2, "width": 3, "height": 4}),
        confidence: 0.9,
        utc: utc.to_string(),
    }
}
