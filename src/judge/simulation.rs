//! Outcome strategies for local judging simulation

use rand::Rng;

use crate::models::{JudgeOutcome, SubmissionId, SubmissionStatus};

/// Produces the outcome a simulated judge reports for a submission
pub trait OutcomeStrategy: Send + Sync {
    fn outcome(&self, submission_id: SubmissionId) -> JudgeOutcome;
}

/// Statuses a simulated judge may report
const SIMULATED_STATUSES: &[SubmissionStatus] = &[
    SubmissionStatus::Accepted,
    SubmissionStatus::CompileError,
    SubmissionStatus::WrongAnswer,
    SubmissionStatus::TimeLimitExceeded,
    SubmissionStatus::MemoryLimitExceeded,
    SubmissionStatus::RuntimeError,
];

/// Uniformly random verdicts, usage figures and partial scores
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOutcome;

impl OutcomeStrategy for RandomOutcome {
    fn outcome(&self, submission_id: SubmissionId) -> JudgeOutcome {
        let mut rng = rand::rng();
        let status = SIMULATED_STATUSES[rng.random_range(0..SIMULATED_STATUSES.len())];

        let outcome = JudgeOutcome::new(submission_id, status);
        match status {
            SubmissionStatus::CompileError => outcome,
            _ => outcome
                .with_usage(rng.random_range(1..=1000), rng.random_range(1024..=65536))
                .with_score(rng.random_range(0..=100)),
        }
    }
}

/// Always reports the same outcome
#[derive(Debug, Clone)]
pub struct FixedOutcome {
    template: JudgeOutcome,
}

impl FixedOutcome {
    /// `template.submission_id` is replaced on every call
    pub fn new(template: JudgeOutcome) -> Self {
        Self { template }
    }

    pub fn status(status: SubmissionStatus) -> Self {
        Self::new(JudgeOutcome::new(0, status))
    }
}

impl OutcomeStrategy for FixedOutcome {
    fn outcome(&self, submission_id: SubmissionId) -> JudgeOutcome {
        JudgeOutcome {
            submission_id,
            ..self.template.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::state_machine::is_terminal;

    #[test]
    fn test_random_outcome_is_terminal() {
        for id in 0..200 {
            let outcome = RandomOutcome.outcome(id);
            assert_eq!(outcome.submission_id, id);
            assert!(is_terminal(outcome.status));
            assert_ne!(outcome.status, SubmissionStatus::SystemError);
            if outcome.status == SubmissionStatus::CompileError {
                assert!(outcome.run_time.is_none());
            }
        }
    }

    #[test]
    fn test_fixed_outcome_rewrites_id() {
        let strategy =
            FixedOutcome::new(JudgeOutcome::new(0, SubmissionStatus::Accepted).with_usage(120, 512));
        let outcome = strategy.outcome(9);
        assert_eq!(outcome.submission_id, 9);
        assert_eq!(outcome.run_time, Some(120));
    }
}
