//! Problem model
//!
//! Problems are owned by the problem store; this service only reads the
//! fields that govern admission and judging.

use serde::{Deserialize, Serialize};

use super::{ProblemId, UserId};

/// Problem metadata consumed by the submission lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInfo {
    pub id: ProblemId,
    pub visibility: ProblemVisibility,
    /// Creator of the problem
    pub owner_id: UserId,
    /// Milliseconds
    pub time_limit: i32,
    /// Megabytes
    pub memory_limit: i32,
    pub judge_mode: JudgeMode,
    /// Only meaningful in OI mode
    pub total_score: i32,
    pub submit_count: i64,
    pub accepted_count: i64,
}

impl ProblemInfo {
    pub fn is_public(&self) -> bool {
        matches!(self.visibility, ProblemVisibility::Public)
    }

    /// Memory limit in kilobytes, the unit submissions report memory in
    pub fn memory_limit_kb(&self) -> i32 {
        self.memory_limit.saturating_mul(1024)
    }
}

/// Problem visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemVisibility {
    Public,
    Private,
    /// Reserved for a running contest
    Contest,
}

impl ProblemVisibility {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Public),
            1 => Some(Self::Private),
            2 => Some(Self::Contest),
            _ => None,
        }
    }
}

/// Judging mode of a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JudgeMode {
    /// Pass/fail
    Acm,
    /// Score-based
    Oi,
}

impl JudgeMode {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Acm),
            1 => Some(Self::Oi),
            _ => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Oi)
    }
}
