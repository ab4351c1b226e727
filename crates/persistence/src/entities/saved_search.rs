//! Saved search entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::saved_search::SavedSearch;
use domain::models::search::SearchType;
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct SavedSearchEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub search_type: String,
    pub query: String,
    pub filters: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl From<SavedSearchEntity> for SavedSearch {
    fn from(entity: SavedSearchEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            name: entity.name,
            search_type: entity.search_type.parse().unwrap_or(SearchType::Both),
            query: entity.query,
            // Filters saved by an older layout degrade to "no filters".
            filters: serde_json::from_value(entity.filters).unwrap_or_default(),
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filters_round_trip_from_row() {
        let entity = SavedSearchEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "عمالة هندية".to_string(),
            search_type: "employees".to_string(),
            query: "".to_string(),
            filters: json!({"employees": {"nationality": "هندي"}}),
            created_at: Utc::now(),
        };
        let saved: SavedSearch = entity.into();
        assert_eq!(saved.search_type, SearchType::Employees);
        assert_eq!(saved.filters.employees.nationality.as_deref(), Some("هندي"));
    }

    #[test]
    fn test_unreadable_filters_fall_back_to_default() {
        let entity = SavedSearchEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "x".to_string(),
            search_type: "both".to_string(),
            query: "".to_string(),
            filters: json!("not an object"),
            created_at: Utc::now(),
        };
        let saved: SavedSearch = entity.into();
        assert!(saved.filters.employees.nationality.is_none());
    }
}
