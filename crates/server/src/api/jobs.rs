//! Job API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use phrasereel_core::{
    ConcurrencyError, GenerationError, GeneratorStatus, JobStatus, ProgressEvent,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a job
#[derive(Debug, Default, Deserialize)]
pub struct CreateJobBody {
    /// Caller-chosen job id; a UUID is generated when omitted
    pub id: Option<String>,
}

/// Response for an accepted job
#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub id: String,
    pub status: JobStatus,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<JobErrorResponse>);

fn error_response(status: StatusCode, err: &GenerationError) -> ApiError {
    (
        status,
        Json(JobErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

fn admission_status(err: &GenerationError) -> StatusCode {
    match err {
        GenerationError::Concurrency(ConcurrencyError::CapacityReached { .. }) => {
            StatusCode::TOO_MANY_REQUESTS
        }
        GenerationError::Concurrency(ConcurrencyError::DuplicateJob { .. }) => {
            StatusCode::CONFLICT
        }
        GenerationError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Admit a new job and start it in the background
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateJobBody>>,
) -> Result<(StatusCode, Json<CreateJobResponse>), ApiError> {
    let id = body
        .and_then(|Json(body)| body.id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let callback = state.progress().callback();
    match state.generator().start(&id, callback) {
        Ok(_handle) => {
            info!(job_id = %id, "Job accepted");
            Ok((
                StatusCode::ACCEPTED,
                Json(CreateJobResponse {
                    id,
                    status: JobStatus::Pending,
                }),
            ))
        }
        Err(e) => Err(error_response(admission_status(&e), &e)),
    }
}

/// Latest progress of a job
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProgressEvent>, ApiError> {
    let active = state.generator().registry().contains(&id);

    match state.progress().get(&id) {
        // A terminal entry for an active id belongs to an earlier run.
        Some(event) if !(active && event.status.is_terminal()) => Ok(Json(event)),
        _ if active => Ok(Json(ProgressEvent::queued())),
        _ => Err(error_response(
            StatusCode::NOT_FOUND,
            &GenerationError::resource(format!("Job not found: {}", id)),
        )),
    }
}

/// Cancel an active job (DELETE endpoint)
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.generator().cancel(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e @ GenerationError::Resource(_)) => Err(error_response(StatusCode::NOT_FOUND, &e)),
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)),
    }
}

/// Generator capacity and active jobs
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<GeneratorStatus> {
    Json(state.generator().status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_status_codes() {
        let capacity = GenerationError::from(ConcurrencyError::CapacityReached { capacity: 3 });
        let duplicate = GenerationError::from(ConcurrencyError::DuplicateJob {
            job_id: "a".to_string(),
        });
        assert_eq!(admission_status(&capacity), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(admission_status(&duplicate), StatusCode::CONFLICT);
        assert_eq!(
            admission_status(&GenerationError::validation("bad id")),
            StatusCode::BAD_REQUEST
        );
    }
}
