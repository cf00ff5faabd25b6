use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::review::domain::Stage;
use crate::workflows::review::router::review_router;

async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn json_request(method: Method, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

async fn router_with(source_tweak: impl FnOnce(&MemorySource)) -> axum::Router {
    let (board, source, _) = loaded_board(four_across_stages()).await;
    source_tweak(source.as_ref());
    review_router(Arc::new(Mutex::new(board)))
}

#[tokio::test]
async fn board_endpoint_returns_columns_and_summary() {
    let router = router_with(|_| {}).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/review/board")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["summary"]["total"], 4);
    assert_eq!(body["summary"]["search"]["state"], "loaded");
    assert_eq!(body["columns"][1]["stage"], "SELECTED");
    assert_eq!(body["columns"][1]["count"], 2);
}

#[tokio::test]
async fn failed_transition_returns_conflict_with_rolled_back_board() {
    let router = router_with(|source| source.fail_updates_for("a")).await;

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/review/transitions",
            json!({ "application_id": "a", "stage": "HIRED" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["board"]["columns"][0]["application_ids"], json!(["a"]));
    assert_eq!(body["board"]["columns"][3]["application_ids"], json!(["d"]));
}

#[tokio::test]
async fn transition_of_unknown_application_is_not_found() {
    let router = router_with(|_| {}).await;

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/review/transitions",
            json!({ "application_id": "nope", "stage": "SELECTED" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn filter_search_failure_maps_to_bad_gateway() {
    let router = router_with(|source| source.fail_search(true)).await;

    let response = router
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/review/filters",
            json!({ "statuses": ["SELECTED"] }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json_body(response).await;
    assert_eq!(body["board"]["summary"]["search"]["state"], "failed");
    assert_eq!(body["board"]["summary"]["active_filters"], 1);
}

#[tokio::test]
async fn batch_without_selection_is_unprocessable() {
    let router = router_with(|_| {}).await;

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/review/batches",
            json!({ "action": "reject" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn select_all_then_batch_move_over_http() {
    let (board, source, _) = loaded_board(four_across_stages()).await;
    let router = review_router(Arc::new(Mutex::new(board)));

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/review/selection",
            json!({ "op": "select_all" }),
        ))
        .await
        .expect("router responds");
    let body = read_json_body(response).await;
    assert_eq!(body["all_selected"], true);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/review/batches",
            json!({ "action": "move", "stage": "HIRED" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["report"]["attempted"], 4);
    assert_eq!(body["board"]["summary"]["selected"], 0);
    for id in ["a", "b", "c", "d"] {
        assert_eq!(source.remote(id).expect("remote").stage(), Stage::Hired);
    }
}

#[tokio::test]
async fn tag_catalog_endpoints() {
    let router = router_with(|_| {}).await;

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/review/tags",
            json!({ "tag": "Bilingual" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/review/tags",
            json!({ "tag": "Bilingual" }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert!(body["tags"]
        .as_array()
        .expect("tag list")
        .contains(&json!("Bilingual")));
}

#[tokio::test]
async fn remark_endpoint_saves_annotation() {
    let router = router_with(|_| {}).await;

    let response = router
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/review/applications/c/remark",
            json!({ "remark": "Schedule onsite" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["remark"], "Schedule onsite");
}
