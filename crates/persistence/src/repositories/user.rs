//! User repository for database operations.

use domain::models::{Role, User};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Fields written when an administrator creates an account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub role: Role,
    pub permissions: &'a JsonValue,
}

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let row = sqlx::query_as::<_, UserEntity>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(row?.map(Into::into))
    }

    /// Case-insensitive lookup; emails are stored lower-cased.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let row = sqlx::query_as::<_, UserEntity>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(row?.map(Into::into))
    }

    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let rows = sqlx::query_as::<_, UserEntity>(
            r#"SELECT * FROM users ORDER BY created_at ASC"#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(rows?.into_iter().map(Into::into).collect())
    }

    pub async fn create(&self, user: NewUser<'_>) -> Result<User, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let entity = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, password_hash, full_name, role, permissions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user.email.trim().to_lowercase())
        .bind(user.password_hash)
        .bind(user.full_name.trim())
        .bind(user.role.as_str())
        .bind(user.permissions)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(entity?.into())
    }

    /// Partial update; `None` keeps the stored value.
    pub async fn update(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        role: Option<Role>,
        permissions: Option<&JsonValue>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("update_user");
        let row = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                role = COALESCE($3, role),
                permissions = COALESCE($4, permissions),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(full_name.map(str::trim))
        .bind(role.map(|r| r.as_str()))
        .bind(permissions)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(row?.map(Into::into))
    }

    /// Returns `true` if the user exists.
    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("set_user_password");
        let result = sqlx::query(
            r#"UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(r#"UPDATE users SET last_login = NOW() WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Active administrators other than `excluding`.
    pub async fn count_other_active_admins(&self, excluding: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE role = 'admin' AND is_active = TRUE AND id <> $1
            "#,
        )
        .bind(excluding)
        .fetch_one(&self.pool)
        .await
    }
}
