//! Dashboard totals.
//!
//! Only plain counts live here; per-document status breakdowns depend on the
//! threshold settings and are computed from the loaded rows.

use sqlx::{PgPool, Row};

/// Row counts shown on the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardTotals {
    pub companies: i64,
    pub employees: i64,
    pub projects: i64,
    pub unassigned_employees: i64,
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn totals(&self) -> Result<DashboardTotals, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM companies) AS companies,
                (SELECT COUNT(*) FROM employees) AS employees,
                (SELECT COUNT(*) FROM projects) AS projects,
                (SELECT COUNT(*) FROM employees WHERE company_id IS NULL) AS unassigned_employees
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardTotals {
            companies: row.get::<i64, _>("companies"),
            employees: row.get::<i64, _>("employees"),
            projects: row.get::<i64, _>("projects"),
            unassigned_employees: row.get::<i64, _>("unassigned_employees"),
        })
    }
}
