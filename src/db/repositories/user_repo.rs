//! User repository

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::{
    db::store::UserStore,
    error::{AppError, AppResult},
    models::{AccountStatus, Role, UserId, UserInfo},
};

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    role: i16,
    status: i16,
}

impl TryFrom<UserRow> for UserInfo {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_code(row.role).ok_or_else(|| {
            AppError::Database(format!("user {} has unknown role {}", row.id, row.role))
        })?;
        let status = AccountStatus::from_code(row.status).ok_or_else(|| {
            AppError::Database(format!("user {} has unknown status {}", row.id, row.status))
        })?;

        Ok(UserInfo {
            id: row.id,
            role,
            status,
        })
    }
}

/// Repository for user lookups
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user(&self, id: UserId) -> AppResult<Option<UserInfo>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, role, status FROM t_user WHERE id = $1 AND is_deleted = FALSE"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserInfo::try_from).transpose()
    }
}
