//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{
    config::JwtConfig,
    services::{StatsService, SubmissionService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    submissions: Arc<SubmissionService>,
    stats: Arc<StatsService>,
    jwt: JwtConfig,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        submissions: Arc<SubmissionService>,
        stats: Arc<StatsService>,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                submissions,
                stats,
                jwt,
            }),
        }
    }

    pub fn submissions(&self) -> &SubmissionService {
        &self.inner.submissions
    }

    pub fn stats(&self) -> &StatsService {
        &self.inner.stats
    }

    /// Secret used to verify bearer tokens
    pub fn jwt_secret(&self) -> &str {
        &self.inner.jwt.secret
    }
}
