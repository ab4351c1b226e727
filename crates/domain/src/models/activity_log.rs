//! Activity log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    Import,
    Export,
    PasswordChange,
    SettingsUpdate,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Create => "create",
            ActivityAction::Update => "update",
            ActivityAction::Delete => "delete",
            ActivityAction::Login => "login",
            ActivityAction::Logout => "logout",
            ActivityAction::Import => "import",
            ActivityAction::Export => "export",
            ActivityAction::PasswordChange => "password_change",
            ActivityAction::SettingsUpdate => "settings_update",
        }
    }
}

impl FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(ActivityAction::Create),
            "update" => Ok(ActivityAction::Update),
            "delete" => Ok(ActivityAction::Delete),
            "login" => Ok(ActivityAction::Login),
            "logout" => Ok(ActivityAction::Logout),
            "import" => Ok(ActivityAction::Import),
            "export" => Ok(ActivityAction::Export),
            "password_change" => Ok(ActivityAction::PasswordChange),
            "settings_update" => Ok(ActivityAction::SettingsUpdate),
            _ => Err(format!("Unknown activity action: {}", s)),
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Company,
    Employee,
    Project,
    User,
    Settings,
    Alert,
    SavedSearch,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Company => "company",
            EntityType::Employee => "employee",
            EntityType::Project => "project",
            EntityType::User => "user",
            EntityType::Settings => "settings",
            EntityType::Alert => "alert",
            EntityType::SavedSearch => "saved_search",
        }
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "company" => Ok(EntityType::Company),
            "employee" => Ok(EntityType::Employee),
            "project" => Ok(EntityType::Project),
            "user" => Ok(EntityType::User),
            "settings" => Ok(EntityType::Settings),
            "alert" => Ok(EntityType::Alert),
            "saved_search" => Ok(EntityType::SavedSearch),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: JsonValue,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert; built with `ActivityLogBuilder`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub user_id: Option<Uuid>,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub details: JsonValue,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListActivityLogsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub user_id: Option<Uuid>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<ActivityAction>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
