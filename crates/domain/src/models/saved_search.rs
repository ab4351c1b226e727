//! Saved advanced-search presets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::search::{SearchFilters, SearchType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SavedSearch {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub search_type: SearchType,
    pub query: String,
    pub filters: SearchFilters,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateSavedSearchRequest {
    #[validate(length(min = 1, max = 100, message = "اسم البحث مطلوب"))]
    pub name: String,

    #[serde(default)]
    pub search_type: SearchType,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub query: String,

    #[serde(default)]
    pub filters: SearchFilters,
}
