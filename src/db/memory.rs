//! In-memory store
//!
//! Backs the test suite and the no-database demo mode. Submissions, problems
//! and users sit behind one mutex, so the compare-and-swap in `complete` and
//! the accepted-count increment it triggers are a single critical section.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    db::store::{ProblemStore, SubmissionStore, UserStore},
    error::{AppError, AppResult},
    models::{
        NewSubmission, ProblemId, ProblemInfo, Submission, SubmissionFilter, SubmissionId,
        SubmissionStatus, UserId, UserInfo, UserProblemStatus, Verdict,
    },
};

#[derive(Default)]
struct MemoryState {
    submissions: BTreeMap<SubmissionId, Submission>,
    problems: HashMap<ProblemId, ProblemInfo>,
    users: HashMap<UserId, UserInfo>,
    last_submission_id: SubmissionId,
}

/// Mutex-guarded store implementing every storage seam
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserInfo) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn insert_problem(&self, problem: ProblemInfo) {
        self.state.lock().await.problems.insert(problem.id, problem);
    }

    /// Insert a fully-formed submission, keeping the ID sequence ahead of it
    pub async fn insert_submission(&self, submission: Submission) {
        let mut state = self.state.lock().await;
        state.last_submission_id = state.last_submission_id.max(submission.id);
        state.submissions.insert(submission.id, submission);
    }

    /// Number of stored submissions, deleted ones included
    pub async fn submission_count(&self) -> usize {
        self.state.lock().await.submissions.len()
    }
}

/// Accepted-submission ordering: fastest first, then earliest, then lowest ID
fn best_key(submission: &Submission) -> (bool, i32, DateTime<Utc>, SubmissionId) {
    (
        submission.run_time.is_none(),
        submission.run_time.unwrap_or(i32::MAX),
        submission.create_time,
        submission.id,
    )
}

fn is_live(submission: &Submission, user_id: UserId, problem_id: ProblemId) -> bool {
    !submission.is_deleted && submission.user_id == user_id && submission.problem_id == problem_id
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create(&self, new: NewSubmission) -> AppResult<Submission> {
        let mut state = self.state.lock().await;
        state.last_submission_id += 1;

        let now = Utc::now();
        let submission = Submission {
            id: state.last_submission_id,
            problem_id: new.problem_id,
            user_id: new.user_id,
            language: new.language,
            code: new.code,
            status: SubmissionStatus::Pending,
            run_time: None,
            memory: None,
            judge_info: None,
            error_message: None,
            score: None,
            create_time: now,
            update_time: now,
            is_deleted: false,
        };
        state.submissions.insert(submission.id, submission.clone());

        Ok(submission)
    }

    async fn discard(&self, id: SubmissionId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let pending = state
            .submissions
            .get(&id)
            .is_some_and(|s| s.status == SubmissionStatus::Pending);
        if pending {
            state.submissions.remove(&id);
        }
        Ok(pending)
    }

    async fn find_by_id(&self, id: SubmissionId) -> AppResult<Option<Submission>> {
        let state = self.state.lock().await;
        Ok(state
            .submissions
            .get(&id)
            .filter(|s| !s.is_deleted)
            .cloned())
    }

    async fn list(&self, filter: &SubmissionFilter) -> AppResult<(Vec<Submission>, i64)> {
        let state = self.state.lock().await;

        let mut matching: Vec<&Submission> = state
            .submissions
            .values()
            .filter(|s| filter.matches(s))
            .collect();
        matching.sort_by(|a, b| {
            b.create_time
                .cmp(&a.create_time)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matching.len() as i64;
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let records = matching
            .into_iter()
            .skip(offset)
            .take(filter.page_size as usize)
            .cloned()
            .collect();

        Ok((records, total))
    }

    async fn find_best(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
    ) -> AppResult<Option<Submission>> {
        let state = self.state.lock().await;
        Ok(state
            .submissions
            .values()
            .filter(|s| is_live(s, user_id, problem_id) && s.status == SubmissionStatus::Accepted)
            .min_by_key(|s| best_key(s))
            .cloned())
    }

    async fn count_by_user(&self, user_id: UserId) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .submissions
            .values()
            .filter(|s| !s.is_deleted && s.user_id == user_id)
            .count() as i64)
    }

    async fn count_accepted_problems(&self, user_id: UserId) -> AppResult<i64> {
        let state = self.state.lock().await;
        let mut problems: Vec<ProblemId> = state
            .submissions
            .values()
            .filter(|s| {
                !s.is_deleted && s.user_id == user_id && s.status == SubmissionStatus::Accepted
            })
            .map(|s| s.problem_id)
            .collect();
        problems.sort_unstable();
        problems.dedup();
        Ok(problems.len() as i64)
    }

    async fn user_problem_status(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
    ) -> AppResult<UserProblemStatus> {
        let state = self.state.lock().await;
        let mut status = UserProblemStatus::NotAttempted;
        for submission in state
            .submissions
            .values()
            .filter(|s| is_live(s, user_id, problem_id))
        {
            if submission.status == SubmissionStatus::Accepted {
                return Ok(UserProblemStatus::Accepted);
            }
            status = UserProblemStatus::Attempted;
        }
        Ok(status)
    }

    async fn complete(
        &self,
        id: SubmissionId,
        verdict: &Verdict,
    ) -> AppResult<Option<Submission>> {
        let mut state = self.state.lock().await;

        let Some(submission) = state
            .submissions
            .get_mut(&id)
            .filter(|s| !s.is_deleted && s.status == SubmissionStatus::Pending)
        else {
            return Ok(None);
        };

        submission.status = verdict.status;
        submission.run_time = verdict.run_time;
        submission.memory = verdict.memory;
        submission.judge_info = verdict.judge_info.clone();
        submission.error_message = verdict.error_message.clone();
        submission.score = verdict.score;
        submission.update_time = Utc::now();
        let updated = submission.clone();

        if verdict.status == SubmissionStatus::Accepted {
            if let Some(problem) = state.problems.get_mut(&updated.problem_id) {
                problem.accepted_count += 1;
            }
        }

        Ok(Some(updated))
    }

    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<SubmissionId>> {
        let state = self.state.lock().await;
        let mut stale: Vec<&Submission> = state
            .submissions
            .values()
            .filter(|s| {
                !s.is_deleted && s.status == SubmissionStatus::Pending && s.create_time < cutoff
            })
            .collect();
        stale.sort_by_key(|s| s.create_time);

        Ok(stale
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|s| s.id)
            .collect())
    }
}

#[async_trait]
impl ProblemStore for MemoryStore {
    async fn find_problem(&self, id: ProblemId) -> AppResult<Option<ProblemInfo>> {
        Ok(self.state.lock().await.problems.get(&id).cloned())
    }

    async fn increment_submit_count(&self, id: ProblemId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let problem = state
            .problems
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Problem {} not found", id)))?;
        problem.submit_count += 1;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<UserInfo>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }
}
