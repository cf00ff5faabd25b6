use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::batch::BatchAction;
use super::board::ReviewBoard;
use super::domain::{ApplicationId, Stage};
use super::error::ReviewError;
use super::filter::FilterSpec;
use super::source::{MessageDispatcher, RecordSource};

/// Board handle shared between request handlers. The mutex serializes access so
/// the board keeps a single logical thread of control.
pub type SharedBoard<S, M> = Arc<Mutex<ReviewBoard<S, M>>>;

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    pub(crate) application_id: ApplicationId,
    pub(crate) stage: Stage,
    #[serde(default)]
    pub(crate) index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum SelectionRequest {
    Toggle { application_id: ApplicationId },
    SelectAll,
    Clear,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagRequest {
    pub(crate) tag: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemarkRequest {
    pub(crate) remark: String,
}

/// Router exposing the review board over HTTP.
pub fn review_router<S, M>(board: SharedBoard<S, M>) -> Router
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/review/board", get(board_handler::<S, M>))
        .route(
            "/api/v1/review/filters",
            put(apply_filter_handler::<S, M>).delete(clear_filters_handler::<S, M>),
        )
        .route(
            "/api/v1/review/transitions",
            post(transition_handler::<S, M>),
        )
        .route("/api/v1/review/selection", post(selection_handler::<S, M>))
        .route("/api/v1/review/batches", post(batch_handler::<S, M>))
        .route(
            "/api/v1/review/tags",
            get(tags_handler::<S, M>).post(add_tag_handler::<S, M>),
        )
        .route(
            "/api/v1/review/applications/:application_id/remark",
            put(remark_handler::<S, M>),
        )
        .with_state(board)
}

fn board_payload<S, M>(board: &ReviewBoard<S, M>) -> Value
where
    S: RecordSource + ?Sized,
    M: MessageDispatcher + ?Sized,
{
    json!({
        "summary": board.summary(),
        "columns": board.columns(),
    })
}

fn error_response(status: StatusCode, error: &ReviewError, board: Option<Value>) -> Response {
    let mut payload = json!({ "error": error.to_string() });
    if let Some(board) = board {
        payload["board"] = board;
    }
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn board_handler<S, M>(State(board): State<SharedBoard<S, M>>) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let board = board.lock().await;
    (StatusCode::OK, axum::Json(board_payload(&*board))).into_response()
}

pub(crate) async fn apply_filter_handler<S, M>(
    State(board): State<SharedBoard<S, M>>,
    axum::Json(filter): axum::Json<FilterSpec>,
) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let mut board = board.lock().await;
    let outcome = board.apply_filter(filter).await.map(|_| ());
    search_response(&*board, outcome)
}

pub(crate) async fn clear_filters_handler<S, M>(State(board): State<SharedBoard<S, M>>) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let mut board = board.lock().await;
    let outcome = board.clear_filters().await.map(|_| ());
    search_response(&*board, outcome)
}

fn search_response<S, M>(board: &ReviewBoard<S, M>, outcome: Result<(), ReviewError>) -> Response
where
    S: RecordSource + ?Sized,
    M: MessageDispatcher + ?Sized,
{
    match outcome {
        Ok(()) => (StatusCode::OK, axum::Json(board_payload(board))).into_response(),
        Err(error) => error_response(StatusCode::BAD_GATEWAY, &error, Some(board_payload(board))),
    }
}

pub(crate) async fn transition_handler<S, M>(
    State(board): State<SharedBoard<S, M>>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let mut board = board.lock().await;
    match board
        .transition(&request.application_id, request.stage, request.index)
        .await
    {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error @ ReviewError::UnknownApplication(_)) => {
            error_response(StatusCode::NOT_FOUND, &error, None)
        }
        Err(error) => error_response(StatusCode::CONFLICT, &error, Some(board_payload(&*board))),
    }
}

pub(crate) async fn selection_handler<S, M>(
    State(board): State<SharedBoard<S, M>>,
    axum::Json(request): axum::Json<SelectionRequest>,
) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let mut board = board.lock().await;
    match request {
        SelectionRequest::Toggle { application_id } => {
            if !board.toggle(&application_id) {
                let payload = json!({
                    "error": format!("application {application_id} is not visible"),
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        }
        SelectionRequest::SelectAll => board.select_all(),
        SelectionRequest::Clear => board.clear_selection(),
    }

    let payload = json!({
        "selected": board.selected_ids(),
        "all_selected": board.is_all_selected(),
        "indeterminate": board.is_indeterminate(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn batch_handler<S, M>(
    State(board): State<SharedBoard<S, M>>,
    axum::Json(action): axum::Json<BatchAction>,
) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let mut board = board.lock().await;
    match board.execute_batch(action).await {
        Ok(report) if report.is_skipped() => {
            let payload = json!({ "error": "no applications selected" });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Ok(report) => {
            let payload = json!({ "report": report, "board": board_payload(&*board) });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(StatusCode::BAD_GATEWAY, &error, Some(board_payload(&*board))),
    }
}

pub(crate) async fn tags_handler<S, M>(State(board): State<SharedBoard<S, M>>) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let board = board.lock().await;
    (StatusCode::OK, axum::Json(json!({ "tags": board.known_tags() }))).into_response()
}

pub(crate) async fn add_tag_handler<S, M>(
    State(board): State<SharedBoard<S, M>>,
    axum::Json(request): axum::Json<TagRequest>,
) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let board = board.lock().await;
    let status = if board.add_tag(request.tag) {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, axum::Json(json!({ "tags": board.known_tags() }))).into_response()
}

pub(crate) async fn remark_handler<S, M>(
    State(board): State<SharedBoard<S, M>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<RemarkRequest>,
) -> Response
where
    S: RecordSource + 'static,
    M: MessageDispatcher + 'static,
{
    let id = ApplicationId(application_id);
    let mut board = board.lock().await;
    match board.annotate(&id, &request.remark).await {
        Ok(()) => {
            let payload = json!({ "application_id": id, "remark": board.get(&id).and_then(|record| record.remark.clone()) });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error @ ReviewError::UnknownApplication(_)) => {
            error_response(StatusCode::NOT_FOUND, &error, None)
        }
        Err(error) => error_response(StatusCode::BAD_GATEWAY, &error, None),
    }
}
