//! HTTP routes: job lookup and job submission.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use hotdogjobs_core::JobSubmitter;
use hotdogjobs_shared::{HotdogError, Job};

use crate::query::JobQuery;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    query: JobQuery,
    submitter: JobSubmitter,
}

impl AppState {
    pub fn new(query: JobQuery, submitter: JobSubmitter) -> Self {
        Self { query, submitter }
    }
}

/// Body of `GET /jobs/{id}`. `hot_dog` is `null` for unknown ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotDogResponse {
    pub hot_dog: Option<Job>,
}

/// Body of a successful `POST /jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub accepted: bool,
}

/// Build the router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(submit_job))
        .route("/jobs/{id}", get(get_job))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Json<HotDogResponse> {
    let hot_dog = state.query.get(&id);
    debug!(%id, found = hot_dog.is_some(), "job lookup");
    Json(HotDogResponse { hot_dog })
}

async fn submit_job(
    State(state): State<AppState>,
    Json(job): Json<Job>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let health = job.health();
    state.submitter.submit(job).await?;
    debug!(health, "job submitted");
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { accepted: true })))
}

/// Maps library errors onto HTTP status codes.
#[derive(Debug)]
pub struct ApiError(HotdogError);

impl From<HotdogError> for ApiError {
    fn from(e: HotdogError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HotdogError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HotdogError::SendFailure { .. } | HotdogError::ChannelClosed { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, %status, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}
