//! Submission service
//!
//! Admission control on submit, dispatch to the judging pipeline, and the
//! redacted read paths.

use std::sync::Arc;

use crate::{
    db::{ProblemStore, SubmissionStore, UserStore},
    error::{AppError, AppResult},
    judge::Dispatcher,
    models::{
        Caller, NewSubmission, Page, ProblemId, SubmissionFilter, SubmissionId, SubmissionView,
        UserId,
    },
    services::{StatsService, visibility},
    utils::{validate_code, validate_language},
};

/// Submission service for business logic
pub struct SubmissionService {
    submissions: Arc<dyn SubmissionStore>,
    problems: Arc<dyn ProblemStore>,
    users: Arc<dyn UserStore>,
    dispatcher: Arc<dyn Dispatcher>,
    stats: Arc<StatsService>,
}

impl SubmissionService {
    pub fn new(
        submissions: Arc<dyn SubmissionStore>,
        problems: Arc<dyn ProblemStore>,
        users: Arc<dyn UserStore>,
        dispatcher: Arc<dyn Dispatcher>,
        stats: Arc<StatsService>,
    ) -> Self {
        Self {
            submissions,
            problems,
            users,
            dispatcher,
            stats,
        }
    }

    /// Re-resolve the token's caller against the user store
    ///
    /// The stored role wins over the token's claim; missing or disabled
    /// accounts are rejected.
    async fn resolve_caller(&self, caller: &Caller) -> AppResult<Caller> {
        let user = self
            .users
            .find_user(caller.user_id)
            .await?
            .filter(|u| u.is_active())
            .ok_or(AppError::Unauthorized)?;
        Ok(Caller::new(user.id, user.role))
    }

    /// Create a PENDING submission and hand it to the judge
    pub async fn submit(
        &self,
        caller: &Caller,
        problem_id: ProblemId,
        language: String,
        code: String,
    ) -> AppResult<SubmissionId> {
        validate_language(&language).map_err(|e| AppError::Validation(e.to_string()))?;
        validate_code(&code).map_err(|e| AppError::Validation(e.to_string()))?;

        let caller = self.resolve_caller(caller).await?;

        let problem = self
            .problems
            .find_problem(problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))?;

        if !problem.is_public() && !caller.can_access(problem.owner_id) {
            return Err(AppError::Forbidden(
                "You do not have access to this problem".to_string(),
            ));
        }

        let submission = self
            .submissions
            .create(NewSubmission {
                problem_id,
                user_id: caller.user_id,
                language,
                code,
            })
            .await?;

        if let Err(e) = self.dispatcher.enqueue(submission.id).await {
            tracing::error!(
                submission_id = submission.id,
                problem_id,
                error = %e,
                "Failed to dispatch submission"
            );
            match self.submissions.discard(submission.id).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!(
                    submission_id = submission.id,
                    "Undispatched submission was no longer pending"
                ),
                Err(discard_err) => tracing::error!(
                    submission_id = submission.id,
                    error = %discard_err,
                    "Failed to roll back undispatched submission"
                ),
            }
            return Err(e.into());
        }

        if let Err(e) = self.problems.increment_submit_count(problem_id).await {
            // The job is already out; failing the submit now would orphan it
            tracing::error!(
                submission_id = submission.id,
                problem_id,
                error = %e,
                "Failed to increment submit count"
            );
        }

        tracing::info!(
            submission_id = submission.id,
            problem_id,
            user_id = caller.user_id,
            "Submission accepted"
        );

        Ok(submission.id)
    }

    /// Get a submission by ID
    pub async fn get_by_id(&self, id: SubmissionId, caller: &Caller) -> AppResult<SubmissionView> {
        let caller = self.resolve_caller(caller).await?;
        let submission = self
            .submissions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        Ok(visibility::project(submission, &caller))
    }

    /// List submissions, newest first
    pub async fn list(
        &self,
        filter: SubmissionFilter,
        caller: &Caller,
    ) -> AppResult<Page<SubmissionView>> {
        let caller = self.resolve_caller(caller).await?;
        if filter.user_id.is_some_and(|id| !caller.can_access(id)) {
            return Err(AppError::Forbidden(
                "You can only filter by your own submissions".to_string(),
            ));
        }

        let (rows, total) = self.submissions.list(&filter).await?;
        let records = rows
            .into_iter()
            .map(|s| visibility::project(s, &caller))
            .collect();

        Ok(Page::new(records, total, filter.page, filter.page_size))
    }

    /// Fastest accepted submission of `user_id` for a problem
    pub async fn get_user_best_submission(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
        caller: &Caller,
    ) -> AppResult<Option<SubmissionView>> {
        let caller = self.resolve_caller(caller).await?;
        let best = self.stats.best_submission(user_id, problem_id).await?;
        Ok(best.map(|s| visibility::project(s, &caller)))
    }
}
