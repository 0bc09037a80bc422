//! Submission handler implementations

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    error::AppResult,
    handlers::response::ApiResponse,
    models::{Caller, Page, SubmissionId, SubmissionView},
    state::AppState,
};

use super::{
    request::{CreateSubmissionRequest, ListSubmissionsRequest, ProblemQuery},
    response::{CreateSubmissionResponse, ProblemStatusResponse},
};

/// Create a new submission
pub async fn create_submission(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<ApiResponse<CreateSubmissionResponse>> {
    payload.validate()?;

    let submission_id = state
        .submissions()
        .submit(&caller, payload.problem_id, payload.language, payload.code)
        .await?;

    Ok(ApiResponse::with_status(
        StatusCode::ACCEPTED,
        "Submission received and queued for judging",
        CreateSubmissionResponse { submission_id },
    ))
}

/// Get submission by ID
pub async fn get_submission(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<SubmissionId>,
) -> AppResult<ApiResponse<SubmissionView>> {
    let view = state.submissions().get_by_id(id, &caller).await?;
    Ok(ApiResponse::ok(view))
}

/// List submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<ListSubmissionsRequest>,
) -> AppResult<ApiResponse<Page<SubmissionView>>> {
    payload.validate()?;

    let filter = payload.into_filter()?;
    let page = state.submissions().list(filter, &caller).await?;
    Ok(ApiResponse::ok(page))
}

/// Caller's fastest accepted submission for a problem
pub async fn get_best_submission(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ProblemQuery>,
) -> AppResult<ApiResponse<Option<SubmissionView>>> {
    let best = state
        .submissions()
        .get_user_best_submission(caller.user_id, query.problem_id, &caller)
        .await?;
    Ok(ApiResponse::ok(best))
}

/// Whether the caller has solved or attempted a problem
pub async fn get_problem_status(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ProblemQuery>,
) -> AppResult<ApiResponse<ProblemStatusResponse>> {
    let status = state
        .stats()
        .user_problem_status(caller.user_id, query.problem_id)
        .await?;
    Ok(ApiResponse::ok(ProblemStatusResponse {
        problem_id: query.problem_id,
        status,
    }))
}
