use crate::cli::ServeArgs;
use crate::infra::{seeded_board, AppState};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hiring_review::config::AppConfig;
use hiring_review::error::AppError;
use hiring_review::telemetry;
use hiring_review::workflows::review::JobId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(job) = args.job.take().filter(|job| !job.trim().is_empty()) {
        config.review.job_id = JobId(job.trim().to_string());
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (mut board, _, _) = seeded_board(config.review.job_id.clone(), &config.review.default_tags);
    match board.load().await {
        Ok(visible) => info!(job_id = %config.review.job_id, visible, "review board loaded"),
        Err(error) => warn!(%error, "initial board load failed; serving empty board"),
    }
    let board = Arc::new(Mutex::new(board));

    let app = with_review_routes(board)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "hiring review service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
