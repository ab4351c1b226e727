//! Activity log repository for database operations.

use domain::models::activity_log::ListActivityLogsQuery;
use domain::models::{ActivityLog, NewActivityLog, PageRequest};
use sqlx::PgPool;

use crate::entities::ActivityLogEntity;
use crate::metrics::QueryTimer;

/// Builds the WHERE clause for optional activity-log filters, tracking
/// parameter positions so count and list queries share it.
struct ActivityLogFilterBuilder {
    conditions: Vec<String>,
    param_count: usize,
}

impl ActivityLogFilterBuilder {
    fn build(query: &ListActivityLogsQuery) -> Self {
        let mut conditions = vec!["TRUE".to_string()];
        let mut param_count = 0;

        if query.user_id.is_some() {
            param_count += 1;
            conditions.push(format!("a.user_id = ${}", param_count));
        }
        if query.entity_type.is_some() {
            param_count += 1;
            conditions.push(format!("a.entity_type = ${}", param_count));
        }
        if query.entity_id.is_some() {
            param_count += 1;
            conditions.push(format!("a.entity_id = ${}", param_count));
        }
        if query.action.is_some() {
            param_count += 1;
            conditions.push(format!("a.action = ${}", param_count));
        }
        if query.from.is_some() {
            param_count += 1;
            conditions.push(format!("a.created_at >= ${}", param_count));
        }
        if query.to.is_some() {
            param_count += 1;
            conditions.push(format!("a.created_at <= ${}", param_count));
        }

        Self {
            conditions,
            param_count,
        }
    }

    fn where_clause(&self) -> String {
        self.conditions.join(" AND ")
    }
}

macro_rules! bind_activity_filters {
    ($builder:expr, $query:expr) => {{
        let mut b = $builder;
        if let Some(user_id) = $query.user_id {
            b = b.bind(user_id);
        }
        if let Some(entity_type) = $query.entity_type {
            b = b.bind(entity_type.as_str());
        }
        if let Some(ref entity_id) = $query.entity_id {
            b = b.bind(entity_id);
        }
        if let Some(action) = $query.action {
            b = b.bind(action.as_str());
        }
        if let Some(from) = $query.from {
            b = b.bind(from);
        }
        if let Some(to) = $query.to {
            b = b.bind(to);
        }
        b
    }};
}

/// Repository for activity log database operations.
#[derive(Clone)]
pub struct ActivityLogRepository {
    pool: PgPool,
}

impl ActivityLogRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: NewActivityLog) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_activity_log");
        let result = sqlx::query(
            r#"
            INSERT INTO activity_log (user_id, action, entity_type, entity_id, details, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(entry.entity_type.as_str())
        .bind(&entry.entity_id)
        .bind(&entry.details)
        .bind(&entry.ip_address)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Writes the entry in the background. Failures are logged, never
    /// surfaced to the request that triggered them.
    pub fn insert_async(&self, entry: NewActivityLog) {
        let repo = self.clone();
        tokio::spawn(async move {
            let action = entry.action;
            if let Err(e) = repo.insert(entry).await {
                tracing::error!(error = %e, action = %action, "Failed to write activity log");
            }
        });
    }

    /// Newest first.
    pub async fn list(
        &self,
        query: &ListActivityLogsQuery,
    ) -> Result<(Vec<ActivityLog>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_activity_logs");
        let page = PageRequest::new(query.page, query.per_page);
        let filter = ActivityLogFilterBuilder::build(query);
        let where_clause = filter.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM activity_log a WHERE {}", where_clause);
        let count_builder = sqlx::query_scalar::<_, i64>(&count_sql);
        let total = bind_activity_filters!(count_builder, query)
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            r#"
            SELECT a.id, a.user_id, u.email AS user_email, a.action, a.entity_type,
                   a.entity_id, a.details, a.ip_address, a.created_at
            FROM activity_log a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE {}
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ${} OFFSET ${}
            "#,
            where_clause,
            filter.param_count + 1,
            filter.param_count + 2
        );
        let list_builder = sqlx::query_as::<_, ActivityLogEntity>(&list_sql);
        let entities = bind_activity_filters!(list_builder, query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        timer.record();

        Ok((entities.into_iter().map(Into::into).collect(), total))
    }
}
