//! Judging dispatch backends
//!
//! A dispatcher hands a persisted PENDING submission to whatever produces
//! its judge result. Duplicate enqueues are allowed; the result applier
//! absorbs duplicate results.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::Rng;
use redis::aio::ConnectionManager;

use crate::{
    constants::{SIMULATION_APPLY_MAX_ATTEMPTS, SIMULATION_RETRY_BASE_MS},
    error::DispatchError,
    judge::{
        applier::{ApplyOutcome, ResultApplier},
        simulation::OutcomeStrategy,
    },
    models::{JudgeJob, SubmissionId},
};

/// Stream entry field holding the JSON job
pub const JOB_PAYLOAD_FIELD: &str = "payload";

/// Hands submissions to the judging pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Returns once the job is durably queued or the local judge is scheduled
    async fn enqueue(&self, submission_id: SubmissionId) -> Result<(), DispatchError>;
}

/// Publishes `{"submissionId": N}` jobs to a Redis stream
pub struct QueueDispatcher {
    redis: ConnectionManager,
    stream: String,
}

impl QueueDispatcher {
    pub fn new(redis: ConnectionManager, stream: impl Into<String>) -> Self {
        Self {
            redis,
            stream: stream.into(),
        }
    }
}

#[async_trait]
impl Dispatcher for QueueDispatcher {
    async fn enqueue(&self, submission_id: SubmissionId) -> Result<(), DispatchError> {
        let payload = serde_json::to_string(&JudgeJob { submission_id })?;
        let mut conn = self.redis.clone();

        let entry_id: String = redis::cmd("XADD")
            .arg(&self.stream)
            .arg("*")
            .arg(JOB_PAYLOAD_FIELD)
            .arg(&payload)
            .query_async(&mut conn)
            .await?;

        tracing::info!(
            submission_id,
            stream = %self.stream,
            entry_id = %entry_id,
            "Submission queued for judging"
        );

        Ok(())
    }
}

/// Judges in-process: after a random delay, asks an [`OutcomeStrategy`] for a
/// result and applies it directly
pub struct LocalSimulationDispatcher {
    applier: Arc<ResultApplier>,
    strategy: Arc<dyn OutcomeStrategy>,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl LocalSimulationDispatcher {
    pub fn new(
        applier: Arc<ResultApplier>,
        strategy: Arc<dyn OutcomeStrategy>,
        min_delay_ms: u64,
        max_delay_ms: u64,
    ) -> Self {
        Self {
            applier,
            strategy,
            min_delay_ms: min_delay_ms.min(max_delay_ms),
            max_delay_ms,
        }
    }

    /// Simulated judging latency in milliseconds
    fn next_delay_ms(&self) -> u64 {
        rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms)
    }
}

/// Backoff in milliseconds after failed attempt `attempt` (1-based),
/// doubling each time
fn retry_backoff_ms(attempt: u32) -> u64 {
    let factor = 1u64 << attempt.saturating_sub(1).min(16);
    SIMULATION_RETRY_BASE_MS.saturating_mul(factor)
}

/// Judge one submission after `delay_ms`, retrying store failures
async fn judge_locally(
    applier: Arc<ResultApplier>,
    strategy: Arc<dyn OutcomeStrategy>,
    submission_id: SubmissionId,
    delay_ms: u64,
) {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let outcome = strategy.outcome(submission_id);
    let mut attempt = 1;
    loop {
        match applier.apply(&outcome).await {
            Ok(ApplyOutcome::Applied(_)) => {
                tracing::debug!(submission_id, attempt, "Simulated judge result applied");
                return;
            }
            Ok(ApplyOutcome::AlreadyApplied { .. }) => return,
            Err(e) if e.is_retryable() && attempt < SIMULATION_APPLY_MAX_ATTEMPTS => {
                let backoff_ms = retry_backoff_ms(attempt);
                tracing::warn!(
                    submission_id,
                    attempt,
                    backoff_ms,
                    error = %e,
                    "Failed to apply simulated judge result, retrying"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(submission_id, attempt, error = %e, "Simulated judging failed");
                return;
            }
        }
    }
}

#[async_trait]
impl Dispatcher for LocalSimulationDispatcher {
    async fn enqueue(&self, submission_id: SubmissionId) -> Result<(), DispatchError> {
        let delay_ms = self.next_delay_ms();
        tokio::spawn(judge_locally(
            self.applier.clone(),
            self.strategy.clone(),
            submission_id,
            delay_ms,
        ));

        tracing::info!(
            submission_id,
            delay_ms,
            "Submission scheduled for simulated judging"
        );

        Ok(())
    }
}

/// Tries `primary` and falls back to `fallback` when it fails
pub struct FailoverDispatcher {
    primary: Arc<dyn Dispatcher>,
    fallback: Arc<dyn Dispatcher>,
}

impl FailoverDispatcher {
    pub fn new(primary: Arc<dyn Dispatcher>, fallback: Arc<dyn Dispatcher>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Dispatcher for FailoverDispatcher {
    async fn enqueue(&self, submission_id: SubmissionId) -> Result<(), DispatchError> {
        match self.primary.enqueue(submission_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    submission_id,
                    error = %e,
                    "Judge queue unavailable, falling back to simulated judging"
                );
                self.fallback.enqueue(submission_id).await
            }
        }
    }
}
