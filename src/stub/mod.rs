//! In-memory reference backend.
//!
//! Serves the gateway contract without a vector store, language model or
//! broker so the dev gateway and client can be exercised end to end. Frames
//! that a live subscriber would receive are fed in through [`StubBackend::ingest`].
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → handlers.rs (decode, validate, map errors to ErrorBody)
//!     → store.rs (collections, label stats, filters, search)
//!     → session.rs (start/stop/status state machine)
//! ```

pub mod handlers;
pub mod session;
pub mod store;

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::gateway::types::IngestFrame;
use self::session::SessionMachine;
use self::store::CollectionStore;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed frames: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid frame on line {line}: {source}")]
    Frame {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct StubBackend {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    store: CollectionStore,
    session: SessionMachine,
    transition_latency: Duration,
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StubBackend {
    pub fn new() -> Self {
        Self::with_transition_latency(Duration::ZERO)
    }

    /// A stub whose start/stop handlers take `latency` to answer.
    pub fn with_transition_latency(latency: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: CollectionStore::new(),
                session: SessionMachine::new(),
                transition_latency: latency,
            }),
        }
    }

    pub fn store(&self) -> &CollectionStore {
        &self.inner.store
    }

    pub fn session(&self) -> &SessionMachine {
        &self.inner.session
    }

    pub fn latency(&self) -> Duration {
        self.inner.transition_latency
    }

    /// Feed one detection frame, as the MQTT subscriber would.
    pub fn ingest(&self, frame: &IngestFrame) -> usize {
        self.inner.store.ingest(frame)
    }

    /// Ingest newline-delimited frames, one JSON `IngestFrame` per line.
    ///
    /// Blank lines are skipped. Returns the number of items added.
    pub fn seed(&self, reader: impl BufRead) -> Result<usize, SeedError> {
        let mut added = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let frame: IngestFrame = serde_json::from_str(&line).map_err(|source| {
                SeedError::Frame {
                    line: index + 1,
                    source,
                }
            })?;
            added += self.ingest(&frame);
        }
        Ok(added)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/collection", get(handlers::list_detections))
            .route(
                "/collections",
                get(handlers::list_collections).post(handlers::create_collection),
            )
            .route(
                "/collections/{name}",
                get(handlers::fetch_collection).delete(handlers::delete_collection),
            )
            .route("/collections/{name}/stats", get(handlers::label_stats))
            .route("/query", post(handlers::query))
            .route("/query-collection", post(handlers::query_collection))
            .route("/mqtt/start", post(handlers::mqtt_start))
            .route("/mqtt/stop", post(handlers::mqtt_stop))
            .route("/mqtt/status", get(handlers::mqtt_status))
            .with_state(self.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until a shutdown signal arrives.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Stub backend listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Stub backend stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::store::DEFAULT_COLLECTION;

    #[test]
    fn seed_reads_frames_per_line() {
        let frames = r#"{"frame": 1, "detections": [{"label": "person", "bbox": {}, "confidence": 0.9, "utc": "2024-05-01T10:00:00"}]}

{"detections": [{"label": "car", "bbox": {}, "confidence": 0.5, "utc": "2024-05-01T10:00:01"}, {"label": "person", "bbox": {}, "confidence": 0.7, "utc": "2024-05-01T10:00:02"}]}
"#;
        let stub = StubBackend::new();
        assert_eq!(stub.seed(frames.as_bytes()).unwrap(), 3);
        assert_eq!(stub.store().summary()[DEFAULT_COLLECTION], 3);
        assert_eq!(stub.store().detections_by_label()["person"].len(), 2);
    }

    #[test]
    fn seed_reports_bad_line() {
        let stub = StubBackend::new();
        let err = stub
            .seed("{\"detections\": []}\nnot json\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, SeedError::Frame { line: 2, .. }), "{err}");
    }
}
