//! Activity log entity.

use chrono::{DateTime, Utc};
use domain::models::ActivityLog;
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Activity log row joined with the acting user's e-mail.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    /// Resolved from `users` at read time; absent for system entries.
    pub user_email: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: JsonValue,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ActivityLogEntity> for ActivityLog {
    fn from(entity: ActivityLogEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            user_email: entity.user_email,
            action: entity.action,
            entity_type: entity.entity_type,
            entity_id: entity.entity_id,
            details: entity.details,
            ip_address: entity.ip_address,
            created_at: entity.created_at,
        }
    }
}
