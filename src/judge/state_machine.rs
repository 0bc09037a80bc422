//! Submission status transitions
//!
//! PENDING is the only initial state and every other status is terminal.
//! A submission leaves PENDING exactly once and never moves again.

use crate::models::SubmissionStatus;

/// Whether no transition is defined out of `status`
pub fn is_terminal(status: SubmissionStatus) -> bool {
    match status {
        SubmissionStatus::Pending => false,
        SubmissionStatus::Accepted
        | SubmissionStatus::CompileError
        | SubmissionStatus::WrongAnswer
        | SubmissionStatus::TimeLimitExceeded
        | SubmissionStatus::MemoryLimitExceeded
        | SubmissionStatus::RuntimeError
        | SubmissionStatus::SystemError => true,
    }
}

/// Whether a submission in `current` may move to `next`
pub fn can_apply(current: SubmissionStatus, next: SubmissionStatus) -> bool {
    current == SubmissionStatus::Pending && is_terminal(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_non_terminal() {
        for status in SubmissionStatus::ALL {
            assert_eq!(is_terminal(*status), *status != SubmissionStatus::Pending);
        }
    }

    #[test]
    fn test_transitions_leave_pending_only() {
        for next in SubmissionStatus::ALL {
            assert_eq!(
                can_apply(SubmissionStatus::Pending, *next),
                *next != SubmissionStatus::Pending
            );
        }

        for current in SubmissionStatus::ALL.iter().filter(|s| is_terminal(**s)) {
            for next in SubmissionStatus::ALL {
                assert!(!can_apply(*current, *next), "{current} -> {next}");
            }
        }
    }
}
