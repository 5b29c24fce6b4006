//! Typed client for the backend contract.
//!
//! Works against the backend directly or through the dev gateway; both speak
//! the same paths. Responses generated by the dev gateway itself (marked with
//! [`GATEWAY_ERROR_HEADER`]) are classified as network failures, so callers
//! see the same error whichever hop failed.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use url::Url;

use crate::config::{GatewayConfig, RetryConfig};
use crate::gateway::error::{GatewayError, GATEWAY_ERROR_HEADER};
use crate::gateway::session::MqttSession;
use crate::gateway::types::*;
use crate::resilience::with_retries;

/// Error constructing a [`GatewayClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),

    #[error("base url `{0}` must be an http(s) url")]
    Scheme(String),

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Clones share the connection pool and the MQTT transition lock.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: Url,
    retries: RetryConfig,
    transitions: Arc<Mutex<()>>,
}

impl GatewayClient {
    /// Client with default timeouts and retry policy.
    pub fn new(base_url: &str) -> Result<Self, ClientBuildError> {
        let config = GatewayConfig::default();
        Self::build(
            base_url,
            Duration::from_secs(config.timeouts.connect_secs),
            Duration::from_secs(config.timeouts.request_secs),
            config.retries,
        )
    }

    /// Client talking straight to the configured backend.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ClientBuildError> {
        Self::build(
            &config.backend.base_url(),
            Duration::from_secs(config.timeouts.connect_secs),
            Duration::from_secs(config.timeouts.request_secs),
            config.retries.clone(),
        )
    }

    fn build(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
        retries: RetryConfig,
    ) -> Result<Self, ClientBuildError> {
        let base_url = Url::parse(base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ClientBuildError::Scheme(base_url.to_string()));
        }

        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            retries,
            transitions: Arc::new(Mutex::new(())),
        })
    }

    /// Replace the retry policy.
    pub fn with_retries(mut self, retries: RetryConfig) -> Self {
        self.retries = retries;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Handle on the backend's MQTT session. Every handle from this client or
    /// its clones shares one transition lock.
    pub fn session(&self) -> MqttSession {
        MqttSession::new(self.clone())
    }

    // --- Collections ---

    /// `GET /collection`: detections of the default collection grouped by label.
    pub async fn list_detections(&self) -> Result<CollectionView, GatewayError> {
        self.call_json(Method::GET, &["collection"], None::<&()>).await
    }

    /// `GET /collections`: every collection with its item count.
    pub async fn list_collections(&self) -> Result<CollectionSummary, GatewayError> {
        self.call_json(Method::GET, &["collections"], None::<&()>).await
    }

    /// `POST /collections`. A duplicate name yields a 409 application error.
    pub async fn create_collection(&self, name: &str) -> Result<CollectionDetail, GatewayError> {
        let body = CreateCollection {
            name: name.to_string(),
        };
        self.call_json(Method::POST, &["collections"], Some(&body)).await
    }

    /// `GET /collections/{name}`.
    pub async fn fetch_collection(&self, name: &str) -> Result<CollectionDetail, GatewayError> {
        self.call_json(Method::GET, &["collections", name], None::<&()>).await
    }

    /// `DELETE /collections/{name}`.
    pub async fn delete_collection(&self, name: &str) -> Result<(), GatewayError> {
        self.call(Method::DELETE, &["collections", name], None::<&()>)
            .await
            .map(|_| ())
    }

    /// `GET /collections/{label}/stats`.
    pub async fn label_stats(&self, label: &str) -> Result<LabelStats, GatewayError> {
        self.call_json(Method::GET, &["collections", label, "stats"], None::<&()>)
            .await
    }

    // --- Queries ---

    /// `POST /query`: free-text question over all detections.
    pub async fn query(&self, question: &str) -> Result<QueryAnswer, GatewayError> {
        let body = QueryRequest {
            question: question.to_string(),
        };
        self.call_json(Method::POST, &["query"], Some(&body)).await
    }

    /// `POST /query-collection`: metadata filter scoped to one collection.
    pub async fn query_collection(
        &self,
        query: &CollectionQuery,
    ) -> Result<QueryResults, GatewayError> {
        self.call_json(Method::POST, &["query-collection"], Some(query))
            .await
    }

    // --- MQTT session ---
    //
    // Start and stop hold the transition lock until the backend answers, so a
    // stop is never issued while a start is in flight. Status does not wait.

    /// `POST /mqtt/start`.
    pub async fn mqtt_start(&self) -> Result<Transition, GatewayError> {
        let _transition = self.transitions.lock().await;
        let body: SessionTransition = self
            .call_json(Method::POST, &["mqtt", "start"], None::<&()>)
            .await?;
        Ok(body.status)
    }

    /// `POST /mqtt/stop`.
    pub async fn mqtt_stop(&self) -> Result<Transition, GatewayError> {
        let _transition = self.transitions.lock().await;
        let body: SessionTransition = self
            .call_json(Method::POST, &["mqtt", "stop"], None::<&()>)
            .await?;
        Ok(body.status)
    }

    /// `GET /mqtt/status`.
    pub async fn mqtt_status(&self) -> Result<SessionStatus, GatewayError> {
        self.call_json(Method::GET, &["mqtt", "status"], None::<&()>)
            .await
    }

    // --- Plumbing ---

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `build`: http(s) urls can always be a base.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request<B: Serialize + ?Sized>(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&B>,
    ) -> RequestBuilder {
        let builder = self.http.request(method.clone(), url.clone());
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<Response, GatewayError> {
        let url = self.url(segments);
        let operation = format!("{} {}", method, url.path());

        tracing::debug!(method = %method, url = %url, "Gateway call");

        // Only reads are safe to repeat once the request may have been seen.
        let idempotent = method == Method::GET;
        let (method_ref, url_ref) = (&method, &url);
        let result = with_retries(&self.retries, &operation, idempotent, || async move {
            let response = self.request(method_ref, url_ref, body).send().await?;
            check_status(response).await
        })
        .await;

        if let Err(err) = &result {
            tracing::warn!(operation = %operation, error = %err, "Gateway call failed");
        }
        result
    }

    async fn call_json<T, B>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.call(method, segments, body).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

/// Map a non-2xx response onto the error taxonomy.
async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let tag = response
        .headers()
        .get(GATEWAY_ERROR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text, status);

    match tag.and_then(|tag| GatewayError::from_gateway_tag(&tag, message.clone())) {
        Some(err) => Err(err),
        None => Err(GatewayError::Application { status, message }),
    }
}

fn error_message(text: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => body.error,
        Err(_) if !text.trim().is_empty() => text.to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}
