//! Problem repository

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::{
    db::store::ProblemStore,
    error::{AppError, AppResult},
    models::{JudgeMode, ProblemId, ProblemInfo, ProblemVisibility},
};

#[derive(Debug, FromRow)]
struct ProblemRow {
    id: i64,
    status: i16,
    create_user_id: i64,
    time_limit: i32,
    memory_limit: i32,
    judge_mode: i16,
    total_score: i32,
    submit_count: i64,
    accepted_count: i64,
}

impl TryFrom<ProblemRow> for ProblemInfo {
    type Error = AppError;

    fn try_from(row: ProblemRow) -> Result<Self, Self::Error> {
        let visibility = ProblemVisibility::from_code(row.status).ok_or_else(|| {
            AppError::Database(format!(
                "problem {} has unknown visibility code {}",
                row.id, row.status
            ))
        })?;
        let judge_mode = JudgeMode::from_code(row.judge_mode).ok_or_else(|| {
            AppError::Database(format!(
                "problem {} has unknown judge mode {}",
                row.id, row.judge_mode
            ))
        })?;

        Ok(ProblemInfo {
            id: row.id,
            visibility,
            owner_id: row.create_user_id,
            time_limit: row.time_limit,
            memory_limit: row.memory_limit,
            judge_mode,
            total_score: row.total_score,
            submit_count: row.submit_count,
            accepted_count: row.accepted_count,
        })
    }
}

/// Repository for problem database operations
#[derive(Clone)]
pub struct ProblemRepository {
    pool: PgPool,
}

impl ProblemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProblemStore for ProblemRepository {
    async fn find_problem(&self, id: ProblemId) -> AppResult<Option<ProblemInfo>> {
        let row = sqlx::query_as::<_, ProblemRow>(
            r#"
            SELECT id, status, create_user_id, time_limit, memory_limit, judge_mode,
                   total_score, submit_count, accepted_count
            FROM t_problem
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProblemInfo::try_from).transpose()
    }

    async fn increment_submit_count(&self, id: ProblemId) -> AppResult<()> {
        let result = sqlx::query(
            r#"UPDATE t_problem SET submit_count = submit_count + 1 WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Problem {} not found", id)));
        }

        Ok(())
    }
}
