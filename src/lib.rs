//! CROJ Judge - Submission Lifecycle & Judging Dispatch
//!
//! This library accepts code submissions against judged problems, tracks
//! each one from PENDING to a single terminal verdict, dispatches judging
//! work, and applies judge results exactly once in effect.
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Admission control, visibility, statistics
//! - **Judge**: State machine, dispatchers, result application
//! - **Db**: Store traits with PostgreSQL and in-memory implementations
//! - **Models**: Domain models

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod judge;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::constants::MAX_REQUEST_BODY_BYTES;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Build the HTTP router with all routes and layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", handlers::routes(state.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
