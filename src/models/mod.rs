//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod judge;
pub mod problem;
pub mod submission;
pub mod user;

pub use judge::*;
pub use problem::*;
pub use submission::*;
pub use user::*;

use serde::Serialize;

/// Submission ID type
pub type SubmissionId = i64;

/// Problem ID type
pub type ProblemId = i64;

/// User ID type
pub type UserId = i64;

/// One page of results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total: i64, page: u32, page_size: u32) -> Self {
        let size = i64::from(page_size.max(1));
        Self {
            records,
            total,
            page,
            page_size,
            pages: (total + size - 1) / size,
        }
    }
}
