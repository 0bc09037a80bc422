//! Judge pipeline messages

use serde::{Deserialize, Serialize};

use super::{SubmissionId, SubmissionStatus};

/// Job published for a judge worker. Workers fetch everything else themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeJob {
    pub submission_id: SubmissionId,
}

/// Result reported by a judge worker (or by local simulation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeOutcome {
    pub submission_id: SubmissionId,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub run_time: Option<i32>,
    #[serde(default)]
    pub memory: Option<i32>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub score: Option<i32>,
    #[serde(default)]
    pub judge_info: Option<String>,
}

impl JudgeOutcome {
    /// Outcome carrying only a status
    pub fn new(submission_id: SubmissionId, status: SubmissionStatus) -> Self {
        Self {
            submission_id,
            status,
            run_time: None,
            memory: None,
            error_message: None,
            score: None,
            judge_info: None,
        }
    }

    pub fn with_usage(mut self, run_time: i32, memory: i32) -> Self {
        self.run_time = Some(run_time);
        self.memory = Some(memory);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_score(mut self, score: i32) -> Self {
        self.score = Some(score);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_wire_format() {
        let json = serde_json::to_string(&JudgeJob { submission_id: 42 }).unwrap();
        assert_eq!(json, r#"{"submissionId":42}"#);
    }

    #[test]
    fn test_outcome_optional_fields() {
        let outcome: JudgeOutcome =
            serde_json::from_str(r#"{"submissionId":5,"status":"WRONG_ANSWER"}"#).unwrap();
        assert_eq!(outcome, JudgeOutcome::new(5, SubmissionStatus::WrongAnswer));

        let outcome: JudgeOutcome = serde_json::from_str(
            r#"{"submissionId":5,"status":"ACCEPTED","runTime":120,"memory":2048}"#,
        )
        .unwrap();
        assert_eq!(outcome.run_time, Some(120));
        assert_eq!(outcome.memory, Some(2048));
    }
}
