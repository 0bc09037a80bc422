//! Judge result application
//!
//! Outcomes arrive at least once, possibly concurrently. The applier turns
//! them into exactly one PENDING -> terminal transition per submission: the
//! terminal check rejects redeliveries up front and the store's
//! compare-and-swap settles any race that slips past it.

use std::sync::Arc;

use crate::{
    db::{ProblemStore, SubmissionStore},
    error::ApplyError,
    judge::state_machine::{can_apply, is_terminal},
    models::{JudgeOutcome, ProblemInfo, Submission, SubmissionStatus, Verdict},
};

/// Result of a successful apply call
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// This call performed the transition
    Applied(Submission),
    /// The submission had already left PENDING; nothing was written
    AlreadyApplied { status: SubmissionStatus },
}

/// Partial score for a score-based problem that was neither accepted nor
/// rejected at compile time
pub trait ScoringPolicy: Send + Sync {
    fn partial_score(&self, outcome: &JudgeOutcome, problem: &ProblemInfo) -> i32;
}

/// Trusts the score reported by the judge, defaulting to zero
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportedScore;

impl ScoringPolicy for ReportedScore {
    fn partial_score(&self, outcome: &JudgeOutcome, _problem: &ProblemInfo) -> i32 {
        outcome.score.unwrap_or(0)
    }
}

/// Applies judge outcomes to submissions
pub struct ResultApplier {
    submissions: Arc<dyn SubmissionStore>,
    problems: Arc<dyn ProblemStore>,
    scoring: Arc<dyn ScoringPolicy>,
}

impl ResultApplier {
    pub fn new(submissions: Arc<dyn SubmissionStore>, problems: Arc<dyn ProblemStore>) -> Self {
        Self {
            submissions,
            problems,
            scoring: Arc::new(ReportedScore),
        }
    }

    pub fn with_scoring(mut self, scoring: Arc<dyn ScoringPolicy>) -> Self {
        self.scoring = scoring;
        self
    }

    /// Apply `outcome` to the submission it names
    pub async fn apply(&self, outcome: &JudgeOutcome) -> Result<ApplyOutcome, ApplyError> {
        let id = outcome.submission_id;

        let current = self
            .submissions
            .find_by_id(id)
            .await?
            .ok_or(ApplyError::NotFound(id))?;

        if is_terminal(current.status) {
            tracing::info!(
                submission_id = id,
                status = %current.status,
                reported = %outcome.status,
                "Duplicate judge result ignored"
            );
            return Ok(ApplyOutcome::AlreadyApplied {
                status: current.status,
            });
        }

        if !can_apply(current.status, outcome.status) {
            tracing::error!(
                submission_id = id,
                from = %current.status,
                to = %outcome.status,
                "Judge result requests an illegal transition"
            );
            return Err(ApplyError::IllegalTransition {
                id,
                from: current.status,
                to: outcome.status,
            });
        }

        let problem = self.problems.find_problem(current.problem_id).await?;
        if problem.is_none() {
            tracing::warn!(
                submission_id = id,
                problem_id = current.problem_id,
                "Problem missing while applying judge result"
            );
        }

        let verdict = self.build_verdict(outcome, problem.as_ref());

        match self.submissions.complete(id, &verdict).await? {
            Some(updated) => {
                tracing::info!(
                    submission_id = id,
                    problem_id = updated.problem_id,
                    status = %updated.status,
                    run_time = ?updated.run_time,
                    "Judge result applied"
                );
                Ok(ApplyOutcome::Applied(updated))
            }
            None => {
                // Lost the compare-and-swap to a concurrent apply
                let winner = self
                    .submissions
                    .find_by_id(id)
                    .await?
                    .ok_or(ApplyError::NotFound(id))?;
                tracing::info!(
                    submission_id = id,
                    status = %winner.status,
                    "Concurrent judge result already applied"
                );
                Ok(ApplyOutcome::AlreadyApplied {
                    status: winner.status,
                })
            }
        }
    }

    fn build_verdict(&self, outcome: &JudgeOutcome, problem: Option<&ProblemInfo>) -> Verdict {
        let status = outcome.status;

        let (run_time, memory) = match status {
            SubmissionStatus::Accepted
            | SubmissionStatus::WrongAnswer
            | SubmissionStatus::RuntimeError => (outcome.run_time, outcome.memory),
            SubmissionStatus::TimeLimitExceeded => (
                exceed(outcome.run_time, problem.map(|p| p.time_limit)),
                outcome.memory,
            ),
            SubmissionStatus::MemoryLimitExceeded => (
                outcome.run_time,
                exceed(outcome.memory, problem.map(ProblemInfo::memory_limit_kb)),
            ),
            SubmissionStatus::CompileError
            | SubmissionStatus::SystemError
            | SubmissionStatus::Pending => (None, None),
        };

        let error_message = match status {
            SubmissionStatus::Accepted | SubmissionStatus::Pending => None,
            _ => Some(
                outcome
                    .error_message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| default_message(status, problem)),
            ),
        };

        let score = problem
            .filter(|p| p.judge_mode.is_scored())
            .map(|p| self.score(outcome, p));

        let judge_info = outcome.judge_info.clone().unwrap_or_else(|| {
            serde_json::json!({
                "status": status,
                "runTime": run_time,
                "memory": memory,
                "score": score,
            })
            .to_string()
        });

        Verdict {
            status,
            run_time,
            memory,
            judge_info: Some(judge_info),
            error_message,
            score,
        }
    }

    fn score(&self, outcome: &JudgeOutcome, problem: &ProblemInfo) -> i32 {
        let total = problem.total_score.max(0);

        match outcome.status {
            SubmissionStatus::Accepted => total,
            SubmissionStatus::CompileError => 0,
            _ => self.scoring.partial_score(outcome, problem).clamp(0, total),
        }
    }
}

/// A usage figure strictly above `limit`, keeping a larger reported value
fn exceed(reported: Option<i32>, limit: Option<i32>) -> Option<i32> {
    let sentinel = limit.map(|l| l.saturating_add(1));
    match (reported, sentinel) {
        (Some(r), Some(s)) => Some(r.max(s)),
        (r, s) => r.or(s),
    }
}

fn default_message(status: SubmissionStatus, problem: Option<&ProblemInfo>) -> String {
    match status {
        SubmissionStatus::CompileError => "Compilation failed".to_string(),
        SubmissionStatus::WrongAnswer => "Output does not match the expected answer".to_string(),
        SubmissionStatus::TimeLimitExceeded => match problem {
            Some(p) => format!("Time limit of {} ms exceeded", p.time_limit),
            None => "Time limit exceeded".to_string(),
        },
        SubmissionStatus::MemoryLimitExceeded => match problem {
            Some(p) => format!("Memory limit of {} MB exceeded", p.memory_limit),
            None => "Memory limit exceeded".to_string(),
        },
        SubmissionStatus::RuntimeError => "Program terminated abnormally".to_string(),
        SubmissionStatus::SystemError => "Judging could not be completed".to_string(),
        SubmissionStatus::Accepted | SubmissionStatus::Pending => String::new(),
    }
}
