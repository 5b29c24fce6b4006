use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::gateway::types::{
    CollectionQuery, CreateCollection, ErrorBody, Item, QueryAnswer, QueryRequest, QueryResults,
    SessionTransition,
};
use crate::stub::store::{StoreError, MAX_CONTEXT_RESULTS};
use crate::stub::StubBackend;

/// Application-level rejection with an `ErrorBody`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            StoreError::NotFound(_) | StoreError::Empty => StatusCode::NOT_FOUND,
            StoreError::InvalidName(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("malformed request body: {}", rejection.body_text()))
    }
}

pub async fn list_detections(State(stub): State<StubBackend>) -> impl IntoResponse {
    Json(stub.store().detections_by_label())
}

pub async fn list_collections(State(stub): State<StubBackend>) -> impl IntoResponse {
    Json(stub.store().summary())
}

pub async fn create_collection(
    State(stub): State<StubBackend>,
    body: Result<Json<CreateCollection>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let created = stub.store().create(&body.name)?;
    tracing::info!(collection = %created.name, "Collection created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn fetch_collection(
    State(stub): State<StubBackend>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(stub.store().fetch(&name)?))
}

pub async fn delete_collection(
    State(stub): State<StubBackend>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    stub.store().delete(&name)?;
    tracing::info!(collection = %name, "Collection deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn label_stats(
    State(stub): State<StubBackend>,
    Path(label): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(stub.store().label_stats(&label)?))
}

pub async fn query(
    State(stub): State<StubBackend>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let question = body.question.trim();
    if question.is_empty() {
        return Err(ApiError::bad_request("question must not be empty"));
    }

    let hits = stub.store().search(question);
    Ok(Json(QueryAnswer {
        context: format_context(&hits),
        answer: summarize(&hits),
    }))
}

pub async fn query_collection(
    State(stub): State<StubBackend>,
    body: Result<Json<CollectionQuery>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(query) = body?;
    let results = stub.store().filter(&query.collection, &query.filter)?;
    Ok(Json(QueryResults { results }))
}

pub async fn mqtt_start(State(stub): State<StubBackend>) -> impl IntoResponse {
    let _in_flight = stub.session().enter_transition();
    simulate_latency(stub.latency()).await;
    Json(SessionTransition {
        status: stub.session().start(),
    })
}

pub async fn mqtt_stop(State(stub): State<StubBackend>) -> impl IntoResponse {
    let _in_flight = stub.session().enter_transition();
    simulate_latency(stub.latency()).await;
    Json(SessionTransition {
        status: stub.session().stop(),
    })
}

pub async fn mqtt_status(State(stub): State<StubBackend>) -> impl IntoResponse {
    Json(stub.session().status())
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

/// One line per detection, in the form the answer model is prompted with.
pub fn format_context(items: &[Item]) -> String {
    if items.is_empty() {
        return "No relevant data found.".to_string();
    }

    items
        .iter()
        .take(MAX_CONTEXT_RESULTS)
        .enumerate()
        .map(|(i, item)| {
            let text = |key: &str, default: &str| {
                item.metadata
                    .get(key)
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .unwrap_or_else(|| default.to_string())
            };
            let confidence = item
                .metadata
                .get("confidence")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            format!(
                "Detection {}: label={}, confidence={:.3}, bbox={}, timestamp={}",
                i + 1,
                text("label", "unknown"),
                confidence,
                text("bbox", "{}"),
                text("utc", "unknown"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn summarize(items: &[Item]) -> String {
    if items.is_empty() {
        return "I could not find any detections related to the question.".to_string();
    }

    let mut counts = std::collections::BTreeMap::<&str, usize>::new();
    for item in items {
        let label = item
            .metadata
            .get("label")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        *counts.entry(label).or_default() += 1;
    }
    let parts: Vec<String> = counts
        .iter()
        .map(|(label, n)| format!("{n} x {label}"))
        .collect();
    format!("Found {} matching detection(s): {}.", items.len(), parts.join(", "))
}
