//! Business logic services

pub mod stats_service;
pub mod submission_service;
pub mod visibility;

pub use stats_service::{StatsService, UserSubmissionStats};
pub use submission_service::SubmissionService;
