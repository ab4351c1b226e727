//! Per-user alert read state.
//!
//! Alerts are derived on demand, so only the ids a user has read are stored.

use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct ReadAlertRepository {
    pool: PgPool,
}

impl ReadAlertRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn read_ids(&self, user_id: Uuid) -> Result<HashSet<String>, sqlx::Error> {
        let timer = QueryTimer::new("list_read_alerts");
        let ids: Result<Vec<String>, _> =
            sqlx::query_scalar(r#"SELECT alert_id FROM read_alerts WHERE user_id = $1"#)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await;
        timer.record();
        Ok(ids?.into_iter().collect())
    }

    /// Idempotent.
    pub async fn mark_read(&self, user_id: Uuid, alert_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO read_alerts (user_id, alert_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, alert_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(alert_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_unread(&self, user_id: Uuid, alert_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(r#"DELETE FROM read_alerts WHERE user_id = $1 AND alert_id = $2"#)
            .bind(user_id)
            .bind(alert_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Marks every id in one statement. Returns the number newly marked.
    pub async fn mark_many_read(
        &self,
        user_id: Uuid,
        alert_ids: &[String],
    ) -> Result<u64, sqlx::Error> {
        if alert_ids.is_empty() {
            return Ok(0);
        }
        let timer = QueryTimer::new("mark_alerts_read");
        let result = sqlx::query(
            r#"
            INSERT INTO read_alerts (user_id, alert_id)
            SELECT $1, UNNEST($2::text[])
            ON CONFLICT (user_id, alert_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(alert_ids)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
