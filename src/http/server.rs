//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Serve the mounted client shell at `/`
//! - Forward routed paths to the backend unchanged
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::gateway::GatewayClient;
use crate::http::request::{
    prepare_upstream, propagate_request_id_layer, request_id, set_request_id_layer,
};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::shell::MountedApp;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub client: Client<HttpConnector, Body>,
    pub app: MountedApp,
    pub gateway: GatewayClient,
    pub request_timeout: Duration,
}

/// Dev server: client shell plus forwarding proxy.
pub struct GatewayServer {
    router: Router,
    app: MountedApp,
}

impl GatewayServer {
    /// Create a server forwarding by `routes` and hosting the mounted `app`.
    pub fn new(
        config: &GatewayConfig,
        routes: Arc<RouteTable>,
        app: MountedApp,
        gateway: GatewayClient,
    ) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            routes,
            client,
            app: app.clone(),
            gateway,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        Self {
            router: Self::build_router(state),
            app,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(page_handler))
            .route("/index.html", get(page_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.app.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
                app.unmount();
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Serve the client shell with the capability's current view.
async fn page_handler(State(state): State<AppState>) -> Response {
    match state.app.render_page(&state.gateway).await {
        Some(page) => Html(page).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "application unmounted").into_response(),
    }
}

/// Main proxy handler.
/// Looks up the route and forwards the request verbatim.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    let Some(route) = state.routes.resolve(&path) else {
        tracing::warn!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, "none", start_time);
        return response::no_route(&path);
    };
    let prefix = route.prefix().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        backend = %route.authority(),
        "Proxying request"
    );

    let (mut parts, body) = request.into_parts();
    if let Err(e) = prepare_upstream(route, &mut parts) {
        tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream request");
        metrics::record_request(method.as_str(), 500, &prefix, start_time);
        return response::internal("failed to build upstream request");
    }
    let upstream = Request::from_parts(parts, body);

    match tokio::time::timeout(state.request_timeout, state.client.request(upstream)).await {
        Ok(Ok(upstream_response)) => {
            let status = upstream_response.status();
            metrics::record_request(method.as_str(), status.as_u16(), &prefix, start_time);
            response::relay(upstream_response)
        }
        Ok(Err(e)) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                connect = e.is_connect(),
                "Upstream error"
            );
            metrics::record_request(method.as_str(), 502, &prefix, start_time);
            if e.is_connect() {
                response::unreachable(format!("backend unreachable: {e}"))
            } else {
                response::interrupted(format!("backend connection failed: {e}"))
            }
        }
        Err(_) => {
            tracing::error!(
                request_id = %request_id,
                timeout = ?state.request_timeout,
                "Upstream timeout"
            );
            metrics::record_request(method.as_str(), 504, &prefix, start_time);
            response::timed_out()
        }
    }
}
