//! System setting entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::SystemSetting;
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Database row mapping for the system_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct SystemSettingEntity {
    pub setting_key: String,
    pub setting_value: JsonValue,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<SystemSettingEntity> for SystemSetting {
    fn from(entity: SystemSettingEntity) -> Self {
        Self {
            setting_key: entity.setting_key,
            setting_value: entity.setting_value,
            description: entity.description,
            updated_at: entity.updated_at,
        }
    }
}
