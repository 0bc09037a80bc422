//! Submission visibility
//!
//! Source code and judge diagnostics are shown only to the submission's
//! owner and to elevated roles. Every read path projects through here.

use crate::models::{Caller, Submission, SubmissionView};

/// Project `submission` for `caller`, redacting what they may not see
pub fn project(submission: Submission, caller: &Caller) -> SubmissionView {
    let visible = caller.can_access(submission.user_id);

    let (code, error_message, judge_info) = if visible {
        (
            Some(submission.code),
            submission.error_message,
            submission.judge_info,
        )
    } else {
        (None, None, None)
    };

    SubmissionView {
        id: submission.id,
        problem_id: submission.problem_id,
        user_id: submission.user_id,
        language: submission.language,
        status: submission.status,
        status_text: submission.status.description(),
        run_time: submission.run_time,
        memory: submission.memory,
        score: submission.score,
        code,
        error_message,
        judge_info,
        create_time: submission.create_time,
    }
}
