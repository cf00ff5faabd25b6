use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json};
use hiring_review::error::AppError;
use hiring_review::workflows::review::{
    review_router, MessageDispatcher, RecordSource, SharedBoard, SortOrder,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecordsQuery {
    #[serde(default)]
    pub(crate) order: SortOrder,
}

pub(crate) fn with_review_routes<S, M>(board: SharedBoard<S, M>) -> axum::Router
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    review_router(board.clone())
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/review/refresh", post(refresh_endpoint::<S, M>))
        .route("/api/v1/review/records", get(records_endpoint::<S, M>))
        .route("/api/v1/review/notices", get(notices_endpoint::<S, M>))
        .layer(Extension(board))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Re-run the current filter against the backend.
pub(crate) async fn refresh_endpoint<S, M>(
    Extension(board): Extension<SharedBoard<S, M>>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let mut board = board.lock().await;
    board.refresh().await?;
    Ok(Json(json!({ "summary": board.summary() })))
}

pub(crate) async fn records_endpoint<S, M>(
    Extension(board): Extension<SharedBoard<S, M>>,
    axum::extract::Query(query): axum::extract::Query<RecordsQuery>,
) -> Json<serde_json::Value>
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let board = board.lock().await;
    Json(json!({ "records": board.visible_records(query.order) }))
}

pub(crate) async fn notices_endpoint<S, M>(
    Extension(board): Extension<SharedBoard<S, M>>,
) -> Json<serde_json::Value>
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let mut board = board.lock().await;
    Json(json!({ "notices": board.drain_notices() }))
}
