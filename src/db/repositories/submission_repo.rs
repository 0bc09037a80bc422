//! Submission repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::{
    db::store::SubmissionStore,
    error::{AppError, AppResult},
    models::{
        NewSubmission, ProblemId, Submission, SubmissionFilter, SubmissionId, SubmissionStatus,
        UserId, UserProblemStatus, Verdict,
    },
};

/// Row shape of `t_submission`
#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: i64,
    problem_id: i64,
    user_id: i64,
    language: String,
    code: String,
    status: i16,
    run_time: Option<i32>,
    memory: Option<i32>,
    judge_info: Option<String>,
    score: Option<i32>,
    error_message: Option<String>,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
    is_deleted: bool,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let status = SubmissionStatus::from_code(row.status).ok_or_else(|| {
            AppError::Database(format!(
                "submission {} has unknown status code {}",
                row.id, row.status
            ))
        })?;

        Ok(Submission {
            id: row.id,
            problem_id: row.problem_id,
            user_id: row.user_id,
            language: row.language,
            code: row.code,
            status,
            run_time: row.run_time,
            memory: row.memory,
            judge_info: row.judge_info,
            error_message: row.error_message,
            score: row.score,
            create_time: row.create_time,
            update_time: row.update_time,
            is_deleted: row.is_deleted,
        })
    }
}

/// Repository for submission database operations
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for SubmissionRepository {
    async fn create(&self, new: NewSubmission) -> AppResult<Submission> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO t_submission (problem_id, user_id, language, code, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.problem_id)
        .bind(new.user_id)
        .bind(&new.language)
        .bind(&new.code)
        .bind(SubmissionStatus::Pending.code())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn discard(&self, id: SubmissionId) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM t_submission WHERE id = $1 AND status = $2"#)
            .bind(id)
            .bind(SubmissionStatus::Pending.code())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_id(&self, id: SubmissionId) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"SELECT * FROM t_submission WHERE id = $1 AND is_deleted = FALSE"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn list(&self, filter: &SubmissionFilter) -> AppResult<(Vec<Submission>, i64)> {
        let status = filter.status.map(|s| s.code());

        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM t_submission
            WHERE
                is_deleted = FALSE
                AND ($1::bigint IS NULL OR user_id = $1)
                AND ($2::bigint IS NULL OR problem_id = $2)
                AND ($3::text IS NULL OR language = $3)
                AND ($4::smallint IS NULL OR status = $4)
            ORDER BY create_time DESC, id DESC
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.problem_id)
        .bind(filter.language.as_deref())
        .bind(status)
        .bind(filter.offset())
        .bind(i64::from(filter.page_size))
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM t_submission
            WHERE
                is_deleted = FALSE
                AND ($1::bigint IS NULL OR user_id = $1)
                AND ($2::bigint IS NULL OR problem_id = $2)
                AND ($3::text IS NULL OR language = $3)
                AND ($4::smallint IS NULL OR status = $4)
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.problem_id)
        .bind(filter.language.as_deref())
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let submissions = rows
            .into_iter()
            .map(Submission::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((submissions, count))
    }

    async fn find_best(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
    ) -> AppResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM t_submission
            WHERE user_id = $1 AND problem_id = $2 AND status = $3 AND is_deleted = FALSE
            ORDER BY run_time ASC NULLS LAST, create_time ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(problem_id)
        .bind(SubmissionStatus::Accepted.code())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn count_by_user(&self, user_id: UserId) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM t_submission WHERE user_id = $1 AND is_deleted = FALSE"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_accepted_problems(&self, user_id: UserId) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT problem_id) FROM t_submission
            WHERE user_id = $1 AND status = $2 AND is_deleted = FALSE
            "#,
        )
        .bind(user_id)
        .bind(SubmissionStatus::Accepted.code())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn user_problem_status(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
    ) -> AppResult<UserProblemStatus> {
        let (attempts, accepted): (i64, Option<bool>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), BOOL_OR(status = $3)
            FROM t_submission
            WHERE user_id = $1 AND problem_id = $2 AND is_deleted = FALSE
            "#,
        )
        .bind(user_id)
        .bind(problem_id)
        .bind(SubmissionStatus::Accepted.code())
        .fetch_one(&self.pool)
        .await?;

        Ok(match (attempts, accepted) {
            (0, _) => UserProblemStatus::NotAttempted,
            (_, Some(true)) => UserProblemStatus::Accepted,
            _ => UserProblemStatus::Attempted,
        })
    }

    async fn complete(
        &self,
        id: SubmissionId,
        verdict: &Verdict,
    ) -> AppResult<Option<Submission>> {
        let mut tx = self.pool.begin().await?;

        // The status predicate makes this the compare-and-swap: a concurrent
        // writer blocks on the row lock and then matches zero rows.
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            UPDATE t_submission
            SET
                status = $3,
                run_time = $4,
                memory = $5,
                judge_info = $6,
                error_message = $7,
                score = $8,
                update_time = NOW()
            WHERE id = $1 AND status = $2 AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(SubmissionStatus::Pending.code())
        .bind(verdict.status.code())
        .bind(verdict.run_time)
        .bind(verdict.memory)
        .bind(verdict.judge_info.as_deref())
        .bind(verdict.error_message.as_deref())
        .bind(verdict.score)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        if verdict.status == SubmissionStatus::Accepted {
            sqlx::query(
                r#"UPDATE t_problem SET accepted_count = accepted_count + 1 WHERE id = $1"#,
            )
            .bind(row.problem_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        row.try_into().map(Some)
    }

    async fn find_stale_pending(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<SubmissionId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM t_submission
            WHERE status = $1 AND is_deleted = FALSE AND create_time < $2
            ORDER BY create_time
            LIMIT $3
            "#,
        )
        .bind(SubmissionStatus::Pending.code())
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
