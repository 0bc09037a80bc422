//! Submission statistics

use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::SubmissionStore,
    error::AppResult,
    models::{ProblemId, Submission, UserId, UserProblemStatus},
};

/// Per-user submission counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSubmissionStats {
    pub user_id: UserId,
    pub submission_count: i64,
    pub accepted_problem_count: i64,
}

/// Read-only queries derived from stored submissions
pub struct StatsService {
    submissions: Arc<dyn SubmissionStore>,
}

impl StatsService {
    pub fn new(submissions: Arc<dyn SubmissionStore>) -> Self {
        Self { submissions }
    }

    pub async fn submission_count(&self, user_id: UserId) -> AppResult<i64> {
        self.submissions.count_by_user(user_id).await
    }

    pub async fn accepted_problem_count(&self, user_id: UserId) -> AppResult<i64> {
        self.submissions.count_accepted_problems(user_id).await
    }

    pub async fn user_stats(&self, user_id: UserId) -> AppResult<UserSubmissionStats> {
        Ok(UserSubmissionStats {
            user_id,
            submission_count: self.submission_count(user_id).await?,
            accepted_problem_count: self.accepted_problem_count(user_id).await?,
        })
    }

    /// Fastest accepted submission, earliest first on equal run time
    pub async fn best_submission(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
    ) -> AppResult<Option<Submission>> {
        self.submissions.find_best(user_id, problem_id).await
    }

    pub async fn user_problem_status(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
    ) -> AppResult<UserProblemStatus> {
        self.submissions
            .user_problem_status(user_id, problem_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        db::MemoryStore,
        models::{SubmissionId, SubmissionStatus},
    };

    fn submission(
        id: SubmissionId,
        problem_id: ProblemId,
        status: SubmissionStatus,
        run_time: Option<i32>,
    ) -> Submission {
        let created = Utc::now() + Duration::seconds(id);
        Submission {
            id,
            problem_id,
            user_id: 2,
            language: "cpp".to_string(),
            code: String::new(),
            status,
            run_time,
            memory: None,
            judge_info: None,
            error_message: None,
            score: None,
            create_time: created,
            update_time: created,
            is_deleted: false,
        }
    }

    async fn seeded() -> StatsService {
        let store = Arc::new(MemoryStore::new());
        for s in [
            submission(1, 10, SubmissionStatus::WrongAnswer, Some(10)),
            submission(2, 10, SubmissionStatus::Accepted, Some(90)),
            submission(3, 10, SubmissionStatus::Accepted, Some(40)),
            submission(4, 10, SubmissionStatus::Accepted, Some(40)),
            submission(5, 11, SubmissionStatus::Accepted, Some(5)),
            submission(6, 12, SubmissionStatus::RuntimeError, None),
        ] {
            store.insert_submission(s).await;
        }
        StatsService::new(store)
    }

    #[tokio::test]
    async fn test_counts() {
        let stats = seeded().await.user_stats(2).await.unwrap();
        assert_eq!(stats.submission_count, 6);
        assert_eq!(stats.accepted_problem_count, 2);
    }

    #[tokio::test]
    async fn test_best_submission_is_fastest_then_earliest() {
        let service = seeded().await;
        let best = service.best_submission(2, 10).await.unwrap().unwrap();
        assert_eq!(best.id, 3);
        assert!(service.best_submission(2, 12).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_problem_status() {
        let service = seeded().await;
        assert_eq!(
            service.user_problem_status(2, 10).await.unwrap(),
            UserProblemStatus::Accepted
        );
        assert_eq!(
            service.user_problem_status(2, 12).await.unwrap(),
            UserProblemStatus::Attempted
        );
        assert_eq!(
            service.user_problem_status(2, 99).await.unwrap(),
            UserProblemStatus::NotAttempted
        );
    }
}
