//! Storage seams used by the submission lifecycle
//!
//! The entity store owns submission records, the problem store owns problem
//! metadata and counters, and the user store answers account lookups. The
//! lifecycle never reaches storage except through these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        NewSubmission, ProblemId, ProblemInfo, Submission, SubmissionFilter, SubmissionId,
        UserId, UserInfo, UserProblemStatus, Verdict,
    },
};

/// Durable keyed storage for submission records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a new PENDING submission
    async fn create(&self, new: NewSubmission) -> AppResult<Submission>;

    /// Remove a PENDING submission whose dispatch failed. Returns whether a row was removed.
    async fn discard(&self, id: SubmissionId) -> AppResult<bool>;

    async fn find_by_id(&self, id: SubmissionId) -> AppResult<Option<Submission>>;

    /// Newest first; returns the page and the total match count
    async fn list(&self, filter: &SubmissionFilter) -> AppResult<(Vec<Submission>, i64)>;

    /// Accepted submission with minimal run time, earliest created on ties
    async fn find_best(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
    ) -> AppResult<Option<Submission>>;

    async fn count_by_user(&self, user_id: UserId) -> AppResult<i64>;

    /// Distinct problems with at least one accepted submission
    async fn count_accepted_problems(&self, user_id: UserId) -> AppResult<i64>;

    async fn user_problem_status(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
    ) -> AppResult<UserProblemStatus>;

    /// Move a PENDING submission to `verdict.status`.
    ///
    /// The status check and write are one compare-and-swap: only a PENDING
    /// row is updated, and when the verdict is ACCEPTED the owning problem's
    /// accepted count is incremented in the same atomic unit. Returns `None`
    /// when the submission was missing or no longer PENDING.
    async fn complete(&self, id: SubmissionId, verdict: &Verdict)
    -> AppResult<Option<Submission>>;

    /// IDs of submissions still PENDING that were created before `cutoff`
    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<SubmissionId>>;
}

/// Read access to problems plus the submit counter
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Non-deleted problem by ID
    async fn find_problem(&self, id: ProblemId) -> AppResult<Option<ProblemInfo>>;

    /// Atomically add one to the problem's submit count
    async fn increment_submit_count(&self, id: ProblemId) -> AppResult<()>;
}

/// Account lookups
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Non-deleted user by ID
    async fn find_user(&self, id: UserId) -> AppResult<Option<UserInfo>>;
}
