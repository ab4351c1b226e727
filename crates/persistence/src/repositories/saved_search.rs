//! Saved search repository.

use domain::models::saved_search::{CreateSavedSearchRequest, SavedSearch};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SavedSearchEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SavedSearchRepository {
    pool: PgPool,
}

impl SavedSearchRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The caller's saved searches, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SavedSearch>, sqlx::Error> {
        let timer = QueryTimer::new("list_saved_searches");
        let rows = sqlx::query_as::<_, SavedSearchEntity>(
            r#"
            SELECT * FROM saved_searches
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(rows?.into_iter().map(Into::into).collect())
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        request: &CreateSavedSearchRequest,
    ) -> Result<SavedSearch, sqlx::Error> {
        let timer = QueryTimer::new("create_saved_search");
        let filters = serde_json::to_value(&request.filters)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let entity = sqlx::query_as::<_, SavedSearchEntity>(
            r#"
            INSERT INTO saved_searches (user_id, name, search_type, query, filters)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(request.name.trim())
        .bind(request.search_type.as_str())
        .bind(request.query.trim())
        .bind(filters)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(entity?.into())
    }

    /// Deletes only if owned by `user_id`. Returns `true` if a row was removed.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM saved_searches WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
