//! Fluent construction of activity-log entries from route handlers.

use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::models::activity_log::{ActivityAction, EntityType, NewActivityLog};

#[derive(Debug, Clone)]
pub struct ActivityLogBuilder {
    user_id: Option<Uuid>,
    action: ActivityAction,
    entity_type: EntityType,
    entity_id: Option<String>,
    details: Map<String, JsonValue>,
    ip_address: Option<String>,
}

impl ActivityLogBuilder {
    /// Entry attributed to a signed-in user.
    pub fn user_action(user_id: Uuid, action: ActivityAction, entity_type: EntityType) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::system_action(action, entity_type)
        }
    }

    /// Entry written by a background job.
    pub fn system_action(action: ActivityAction, entity_type: EntityType) -> Self {
        Self {
            user_id: None,
            action,
            entity_type,
            entity_id: None,
            details: Map::new(),
            ip_address: None,
        }
    }

    pub fn on_entity(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Records the entity's display name under `details.name`.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_detail("name", JsonValue::String(name.into()))
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Records `{old, new}` under `details.changes.<field>` when they differ.
    pub fn with_change<T: Into<JsonValue>>(mut self, field: &str, old: T, new: T) -> Self {
        let (old, new) = (old.into(), new.into());
        if old == new {
            return self;
        }
        let changes = self
            .details
            .entry("changes")
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if let JsonValue::Object(map) = changes {
            let mut entry = Map::new();
            entry.insert("old".to_string(), old);
            entry.insert("new".to_string(), new);
            map.insert(field.to_string(), JsonValue::Object(entry));
        }
        self
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn build(self) -> NewActivityLog {
        NewActivityLog {
            user_id: self.user_id,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            details: JsonValue::Object(self.details),
            ip_address: self.ip_address,
        }
    }
}
