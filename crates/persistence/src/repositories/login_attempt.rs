//! Login attempt history used for lockout decisions.

use chrono::{DateTime, Utc};
use domain::models::{LoginAttemptKind, NewLoginAttempt};
use sqlx::PgPool;

use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct LoginAttemptRepository {
    pool: PgPool,
}

impl LoginAttemptRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, attempt: &NewLoginAttempt) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_login_attempt");
        let result = sqlx::query(
            r#"
            INSERT INTO login_attempts (email, user_id, attempt_type, failure_reason, ip_address)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(attempt.email.trim().to_lowercase())
        .bind(attempt.user_id)
        .bind(attempt.kind.as_str())
        .bind(attempt.failure_reason)
        .bind(&attempt.ip_address)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Failed attempts for `email` after `since` and after its latest
    /// successful login.
    pub async fn count_recent_failures(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_login_failures");
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM login_attempts
            WHERE email = $1
              AND attempt_type = $2
              AND created_at > $3
              AND created_at > COALESCE(
                  (SELECT MAX(created_at) FROM login_attempts
                   WHERE email = $1 AND attempt_type = $4),
                  '-infinity'::timestamptz
              )
            "#,
        )
        .bind(email.trim().to_lowercase())
        .bind(LoginAttemptKind::Failed.as_str())
        .bind(since)
        .bind(LoginAttemptKind::Success.as_str())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        count
    }
}
