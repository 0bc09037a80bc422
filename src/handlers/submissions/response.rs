//! Submission response DTOs

use serde::Serialize;

use crate::models::{ProblemId, SubmissionId, UserProblemStatus};

/// Create submission response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionResponse {
    pub submission_id: SubmissionId,
}

/// Caller's standing on a problem
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatusResponse {
    pub problem_id: ProblemId,
    pub status: UserProblemStatus,
}
