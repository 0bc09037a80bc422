//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProblemId, SubmissionId, UserId};

/// Submission record as held by the entity store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub problem_id: ProblemId,
    pub user_id: UserId,
    pub language: String,
    pub code: String,
    pub status: SubmissionStatus,
    /// Milliseconds; only set once judged
    pub run_time: Option<i32>,
    /// Kilobytes; only set once judged
    pub memory: Option<i32>,
    pub judge_info: Option<String>,
    pub error_message: Option<String>,
    /// Only set for OI-mode problems
    pub score: Option<i32>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Fields supplied when a submission is first persisted
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub problem_id: ProblemId,
    pub user_id: UserId,
    pub language: String,
    pub code: String,
}

/// Terminal fields written by a single PENDING -> terminal transition
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status: SubmissionStatus,
    pub run_time: Option<i32>,
    pub memory: Option<i32>,
    pub judge_info: Option<String>,
    pub error_message: Option<String>,
    pub score: Option<i32>,
}

/// Submission status.
///
/// The integer code is the storage encoding; the wire encoding is the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    /// Waiting for a judge result
    Pending,
    Accepted,
    CompileError,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    /// Judging could not be completed
    SystemError,
}

impl SubmissionStatus {
    /// All statuses, in code order
    pub const ALL: &'static [SubmissionStatus] = &[
        Self::Pending,
        Self::Accepted,
        Self::CompileError,
        Self::WrongAnswer,
        Self::TimeLimitExceeded,
        Self::MemoryLimitExceeded,
        Self::RuntimeError,
        Self::SystemError,
    ];

    /// Storage code
    pub fn code(&self) -> i16 {
        match self {
            Self::Pending => 0,
            Self::Accepted => 1,
            Self::CompileError => 2,
            Self::WrongAnswer => 3,
            Self::TimeLimitExceeded => 4,
            Self::MemoryLimitExceeded => 5,
            Self::RuntimeError => 6,
            Self::SystemError => 7,
        }
    }

    /// Parse a storage code
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Accepted),
            2 => Some(Self::CompileError),
            3 => Some(Self::WrongAnswer),
            4 => Some(Self::TimeLimitExceeded),
            5 => Some(Self::MemoryLimitExceeded),
            6 => Some(Self::RuntimeError),
            7 => Some(Self::SystemError),
            _ => None,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::CompileError => "COMPILE_ERROR",
            Self::WrongAnswer => "WRONG_ANSWER",
            Self::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Self::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::SystemError => "SYSTEM_ERROR",
        }
    }

    /// Human-readable description shown as `statusText`
    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::CompileError => "Compile Error",
            Self::WrongAnswer => "Wrong Answer",
            Self::TimeLimitExceeded => "Time Limit Exceeded",
            Self::MemoryLimitExceeded => "Memory Limit Exceeded",
            Self::RuntimeError => "Runtime Error",
            Self::SystemError => "System Error",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-appropriate projection of a submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: SubmissionId,
    pub problem_id: ProblemId,
    pub user_id: UserId,
    pub language: String,
    pub status: SubmissionStatus,
    pub status_text: &'static str,
    pub run_time: Option<i32>,
    pub memory: Option<i32>,
    pub score: Option<i32>,
    pub code: Option<String>,
    pub error_message: Option<String>,
    pub judge_info: Option<String>,
    pub create_time: DateTime<Utc>,
}

/// Filters for listing submissions
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub user_id: Option<UserId>,
    pub problem_id: Option<ProblemId>,
    pub language: Option<String>,
    pub status: Option<SubmissionStatus>,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

impl SubmissionFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn matches(&self, submission: &Submission) -> bool {
        !submission.is_deleted
            && self.user_id.is_none_or(|id| submission.user_id == id)
            && self.problem_id.is_none_or(|id| submission.problem_id == id)
            && self
                .language
                .as_deref()
                .is_none_or(|lang| submission.language == lang)
            && self.status.is_none_or(|status| submission.status == status)
    }
}

/// Whether a user has solved, attempted, or never touched a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserProblemStatus {
    NotAttempted,
    Accepted,
    Attempted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable() {
        for status in SubmissionStatus::ALL {
            assert_eq!(SubmissionStatus::from_code(status.code()), Some(*status));
        }
        assert_eq!(SubmissionStatus::Pending.code(), 0);
        assert_eq!(SubmissionStatus::SystemError.code(), 7);
        assert_eq!(SubmissionStatus::from_code(8), None);
        assert_eq!(SubmissionStatus::from_code(-1), None);
    }

    #[test]
    fn test_status_wire_name() {
        let json = serde_json::to_string(&SubmissionStatus::TimeLimitExceeded).unwrap();
        assert_eq!(json, "\"TIME_LIMIT_EXCEEDED\"");
        let parsed: SubmissionStatus = serde_json::from_str("\"COMPILE_ERROR\"").unwrap();
        assert_eq!(parsed, SubmissionStatus::CompileError);
    }

    #[test]
    fn test_filter_offset() {
        let filter = SubmissionFilter {
            page: 3,
            page_size: 10,
            ..Default::default()
        };
        assert_eq!(filter.offset(), 20);
    }
}
