//! System settings repository.
//!
//! Settings are free-form JSON values under a string key. The threshold
//! blob is exposed to the domain cache through [`ThresholdStore`].

use async_trait::async_trait;
use domain::models::setting::NOTIFICATION_THRESHOLDS_KEY;
use domain::models::SystemSetting;
use domain::services::{ThresholdStore, ThresholdStoreError};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SystemSettingEntity;
use crate::metrics::QueryTimer;

/// Repository for system setting database operations.
#[derive(Clone)]
pub struct SettingRepository {
    pool: PgPool,
}

impl SettingRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<SystemSetting>, sqlx::Error> {
        let timer = QueryTimer::new("get_setting");
        let row = sqlx::query_as::<_, SystemSettingEntity>(
            r#"
            SELECT setting_key, setting_value, description, updated_at
            FROM system_settings
            WHERE setting_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(row?.map(Into::into))
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<JsonValue>, sqlx::Error> {
        Ok(self.get(key).await?.map(|s| s.setting_value))
    }

    /// Inserts or replaces a setting. Last write wins.
    pub async fn upsert(
        &self,
        key: &str,
        value: &JsonValue,
        updated_by: Option<Uuid>,
    ) -> Result<SystemSetting, sqlx::Error> {
        let timer = QueryTimer::new("upsert_setting");
        let entity = sqlx::query_as::<_, SystemSettingEntity>(
            r#"
            INSERT INTO system_settings (setting_key, setting_value, updated_by, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (setting_key) DO UPDATE
            SET setting_value = EXCLUDED.setting_value,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING setting_key, setting_value, description, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(entity?.into())
    }

    pub async fn list(&self) -> Result<Vec<SystemSetting>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SystemSettingEntity>(
            r#"
            SELECT setting_key, setting_value, description, updated_at
            FROM system_settings
            ORDER BY setting_key
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ThresholdStore for SettingRepository {
    async fn load_thresholds(&self) -> Result<Option<JsonValue>, ThresholdStoreError> {
        self.get_value(NOTIFICATION_THRESHOLDS_KEY)
            .await
            .map_err(|e| ThresholdStoreError::Unavailable(e.to_string()))
    }

    async fn save_thresholds(
        &self,
        value: &JsonValue,
        updated_by: Option<Uuid>,
    ) -> Result<(), ThresholdStoreError> {
        self.upsert(NOTIFICATION_THRESHOLDS_KEY, value, updated_by)
            .await
            .map(|_| ())
            .map_err(|e| ThresholdStoreError::Unavailable(e.to_string()))
    }
}
