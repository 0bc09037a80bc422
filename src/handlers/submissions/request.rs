//! Submission request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::{
    constants::{MAX_CODE_LENGTH, MAX_LANGUAGE_LENGTH},
    error::{AppError, AppResult},
    models::{ProblemId, SubmissionFilter, SubmissionStatus, UserId},
    utils::validate_pagination,
};

/// Create submission request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub problem_id: ProblemId,

    #[validate(length(min = 1, max = MAX_LANGUAGE_LENGTH))]
    pub language: String,

    /// Length is counted in code points
    #[validate(length(min = 1, max = MAX_CODE_LENGTH))]
    pub code: String,
}

/// List submissions body
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListSubmissionsRequest {
    pub user_id: Option<UserId>,
    pub problem_id: Option<ProblemId>,
    #[validate(length(max = MAX_LANGUAGE_LENGTH))]
    pub language: Option<String>,
    pub status: Option<SubmissionStatus>,
    /// 1-based page number
    pub current: Option<u32>,
    pub size: Option<u32>,
}

impl ListSubmissionsRequest {
    pub fn into_filter(self) -> AppResult<SubmissionFilter> {
        let (page, page_size) = validate_pagination(self.current, self.size)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(SubmissionFilter {
            user_id: self.user_id,
            problem_id: self.problem_id,
            language: self.language.filter(|l| !l.is_empty()),
            status: self.status,
            page,
            page_size,
        })
    }
}

/// `?problemId=` query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemQuery {
    pub problem_id: ProblemId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_defaults() {
        let request: ListSubmissionsRequest = serde_json::from_str("{}").unwrap();
        let filter = request.into_filter().unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, 10);
        assert!(filter.user_id.is_none());
    }

    #[test]
    fn test_list_body_fields() {
        let request: ListSubmissionsRequest = serde_json::from_str(
            r#"{"userId":3,"status":"WRONG_ANSWER","language":"","current":2,"size":50}"#,
        )
        .unwrap();
        let filter = request.into_filter().unwrap();
        assert_eq!(filter.user_id, Some(3));
        assert_eq!(filter.status, Some(SubmissionStatus::WrongAnswer));
        assert!(filter.language.is_none());
        assert_eq!(filter.offset(), 50);
    }

    #[test]
    fn test_list_rejects_oversized_page() {
        let request = ListSubmissionsRequest {
            size: Some(101),
            ..Default::default()
        };
        assert!(matches!(request.into_filter(), Err(AppError::Validation(_))));
    }
}
