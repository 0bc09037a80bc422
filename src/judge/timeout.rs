//! Judging timeout sweeper
//!
//! Forces submissions stuck in PENDING to SYSTEM_ERROR. The transition goes
//! through the result applier, so a late real result and the sweeper can
//! race safely.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{TimeDelta, Utc};

use crate::{
    constants::TIMEOUT_SWEEP_BATCH,
    db::SubmissionStore,
    error::AppResult,
    judge::applier::{ApplyOutcome, ResultApplier},
    models::{JudgeOutcome, SubmissionStatus},
};

pub struct TimeoutSweeper {
    submissions: Arc<dyn SubmissionStore>,
    applier: Arc<ResultApplier>,
    timeout_secs: u64,
}

impl TimeoutSweeper {
    pub fn new(
        submissions: Arc<dyn SubmissionStore>,
        applier: Arc<ResultApplier>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            submissions,
            applier,
            timeout_secs,
        }
    }

    /// Time out one batch of stale submissions, returning how many moved
    pub async fn sweep_once(&self) -> AppResult<usize> {
        let age = i64::try_from(self.timeout_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(age)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

        let stale = self
            .submissions
            .find_stale_pending(cutoff, TIMEOUT_SWEEP_BATCH)
            .await?;

        let mut timed_out = 0;
        for id in stale {
            let outcome = JudgeOutcome::new(id, SubmissionStatus::SystemError).with_error_message(
                format!("Judging timed out after {} seconds", self.timeout_secs),
            );

            match self.applier.apply(&outcome).await {
                Ok(ApplyOutcome::Applied(_)) => {
                    tracing::warn!(submission_id = id, "Submission timed out waiting for judge");
                    timed_out += 1;
                }
                Ok(ApplyOutcome::AlreadyApplied { .. }) => {}
                Err(e) => {
                    tracing::error!(submission_id = id, error = %e, "Failed to time out submission");
                }
            }
        }

        Ok(timed_out)
    }

    /// Sweep every `interval` until shutdown
    pub async fn run(self, interval: Duration, shutdown: Arc<AtomicBool>) {
        tracing::info!(
            timeout_secs = self.timeout_secs,
            "Starting judging timeout sweeper"
        );

        let mut ticker = tokio::time::interval(interval);
        while !shutdown.load(Ordering::SeqCst) {
            ticker.tick().await;
            if let Err(e) = self.sweep_once().await {
                tracing::error!(error = %e, "Timeout sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{JudgeMode, ProblemInfo, ProblemVisibility, Submission},
    };

    fn submission(id: i64, status: SubmissionStatus, age_secs: i64) -> Submission {
        let created = Utc::now() - TimeDelta::seconds(age_secs);
        Submission {
            id,
            problem_id: 10,
            user_id: 2,
            language: "cpp".to_string(),
            code: String::new(),
            status,
            run_time: None,
            memory: None,
            judge_info: None,
            error_message: None,
            score: None,
            create_time: created,
            update_time: created,
            is_deleted: false,
        }
    }

    #[tokio::test]
    async fn test_sweep_times_out_only_stale_pending() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_problem(ProblemInfo {
                id: 10,
                visibility: ProblemVisibility::Public,
                owner_id: 1,
                time_limit: 1000,
                memory_limit: 256,
                judge_mode: JudgeMode::Acm,
                total_score: 100,
                submit_count: 3,
                accepted_count: 1,
            })
            .await;
        store
            .insert_submission(submission(1, SubmissionStatus::Pending, 600))
            .await;
        store
            .insert_submission(submission(2, SubmissionStatus::Pending, 5))
            .await;
        store
            .insert_submission(submission(3, SubmissionStatus::Accepted, 600))
            .await;

        let applier = Arc::new(ResultApplier::new(store.clone(), store.clone()));
        let sweeper = TimeoutSweeper::new(store.clone(), applier, 300);

        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);

        let stale = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stale.status, SubmissionStatus::SystemError);
        assert_eq!(
            stale.error_message.as_deref(),
            Some("Judging timed out after 300 seconds")
        );
        let fresh = store.find_by_id(2).await.unwrap().unwrap();
        assert_eq!(fresh.status, SubmissionStatus::Pending);
        let judged = store.find_by_id(3).await.unwrap().unwrap();
        assert_eq!(judged.status, SubmissionStatus::Accepted);

        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
    }
}
