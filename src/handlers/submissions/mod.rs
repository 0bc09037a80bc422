//! Submission handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Submission routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create_submission))
        .route("/list", post(handler::list_submissions))
        .route("/best", get(handler::get_best_submission))
        .route("/status", get(handler::get_problem_status))
        .route("/{id}", get(handler::get_submission))
}
