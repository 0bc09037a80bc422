//! User statistics handlers

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    error::AppResult,
    handlers::response::ApiResponse,
    models::{Caller, UserId},
    services::UserSubmissionStats,
    state::AppState,
};

/// Submission counters for a user
pub async fn get_submission_stats(
    State(state): State<AppState>,
    _caller: Caller,
    Path(id): Path<UserId>,
) -> AppResult<ApiResponse<UserSubmissionStats>> {
    let stats = state.stats().user_stats(id).await?;
    Ok(ApiResponse::ok(stats))
}

/// User routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/{id}/submission-stats", get(get_submission_stats))
}
