//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod health;
pub mod response;
pub mod submissions;
pub mod users;

use axum::{Router, middleware};

use crate::{middleware::auth::auth_middleware, state::AppState};

/// Create all API routes
pub fn routes(state: AppState) -> Router<AppState> {
    let auth = middleware::from_fn_with_state(state, auth_middleware);

    Router::new()
        .merge(health::routes())
        .nest("/submission", submissions::routes().route_layer(auth.clone()))
        .nest("/users", users::routes().route_layer(auth))
}
