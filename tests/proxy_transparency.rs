//! The dev gateway forwards contract paths untouched and never invents
//! application responses.

mod common;

use bifrost_gateway::config::CONTRACT_PREFIXES;
use bifrost_gateway::gateway::{GATEWAY_ERROR_HEADER, UNREACHABLE};
use common::Recorded;
use reqwest::StatusCode;

#[tokio::test]
async fn every_contract_prefix_is_forwarded() {
    let (backend, echo) = common::start_echo_backend().await;
    let (gateway, _shutdown) = common::start_gateway(backend).await;
    let http = reqwest::Client::new();

    for prefix in CONTRACT_PREFIXES {
        let res = http
            .post(format!("{}{prefix}", common::url(gateway)))
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "prefix {prefix}");
        assert_eq!(res.headers()["x-echo"], "1");

        let seen: Recorded = res.json().await.unwrap();
        assert_eq!(seen.path, prefix);
    }
    assert_eq!(echo.requests().len(), CONTRACT_PREFIXES.len());
}

#[tokio::test]
async fn method_path_query_and_body_are_preserved() {
    let (backend, _echo) = common::start_echo_backend().await;
    let (gateway, _shutdown) = common::start_gateway(backend).await;

    let body = r#"{"collection":"bifrost_data","filter":{"label":"person"}}"#;
    let res = reqwest::Client::new()
        .post(format!("{}/query-collection?limit=5&x=a%20b", common::url(gateway)))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();

    let seen: Recorded = res.json().await.unwrap();
    assert_eq!(
        seen,
        Recorded {
            method: "POST".into(),
            path: "/query-collection".into(),
            query: Some("limit=5&x=a%20b".into()),
            body: body.into(),
        }
    );
}

#[tokio::test]
async fn nested_paths_follow_their_prefix() {
    let (backend, echo) = common::start_echo_backend().await;
    let (gateway, _shutdown) = common::start_gateway(backend).await;

    let res = reqwest::Client::new()
        .delete(format!("{}/collections/people", common::url(gateway)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let seen = echo.requests();
    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(seen[0].path, "/collections/people");
}

#[tokio::test]
async fn unrouted_path_is_not_forwarded() {
    let (backend, echo) = common::start_echo_backend().await;
    let (gateway, _shutdown) = common::start_gateway(backend).await;

    let res = reqwest::get(format!("{}/admin/status", common::url(gateway)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().get(GATEWAY_ERROR_HEADER).is_none());

    // Shares a string prefix with /query but not a segment.
    let res = reqwest::get(format!("{}/queryx", common::url(gateway)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert!(echo.requests().is_empty());
}

#[tokio::test]
async fn dead_backend_is_reported_as_unreachable() {
    let backend = common::dead_address().await;
    let (gateway, _shutdown) = common::start_gateway(backend).await;

    let res = reqwest::Client::new()
        .post(format!("{}/mqtt/start", common::url(gateway)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.headers()[GATEWAY_ERROR_HEADER], UNREACHABLE);
}

#[tokio::test]
async fn request_id_is_assigned_and_echoed() {
    let (backend, _echo) = common::start_echo_backend().await;
    let (gateway, _shutdown) = common::start_gateway(backend).await;
    let http = reqwest::Client::new();

    let res = http
        .get(format!("{}/collection", common::url(gateway)))
        .send()
        .await
        .unwrap();
    let assigned = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(assigned).is_ok());

    let res = http
        .get(format!("{}/collection", common::url(gateway)))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn shell_page_is_served_at_root() {
    let (backend, _echo) = common::start_echo_backend().await;
    let (gateway, _shutdown) = common::start_gateway(backend).await;

    let res = reqwest::get(common::url(gateway)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page = res.text().await.unwrap();
    assert!(page.contains(r#"<div id="app">"#));
}
