//! Company repository for database operations.

use domain::models::company::CompanyDeletion;
use domain::models::{Company, CompanyInput, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{CompanyEntity, CompanyWithCountEntity};
use crate::metrics::QueryTimer;

/// Column filters applied in SQL. Document-status filters depend on the
/// threshold settings and are applied by the caller.
#[derive(Debug, Clone, Default)]
pub struct CompanyListFilter {
    pub search: Option<String>,
    pub company_type: Option<String>,
}

/// Binds every column of a [`CompanyInput`] in table order, starting after
/// any parameters already bound.
macro_rules! bind_company_input {
    ($builder:expr, $input:expr) => {{
        $builder
            .bind(&$input.name)
            .bind($input.tax_number)
            .bind(&$input.unified_number)
            .bind(&$input.labor_subscription_number)
            .bind(&$input.company_type)
            .bind($input.commercial_registration_expiry)
            .bind($input.social_insurance_expiry)
            .bind($input.power_subscription_expiry)
            .bind($input.moqeem_subscription_expiry)
            .bind($input.max_employees)
            .bind(&$input.additional_fields)
            .bind(&$input.notes)
    }};
}

/// Repository for company database operations.
#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists companies with their employee counts, ordered by name.
    ///
    /// With `page = None` every matching row is returned.
    pub async fn list(
        &self,
        filter: &CompanyListFilter,
        page: Option<PageRequest>,
    ) -> Result<(Vec<(Company, i64)>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_companies");
        let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM companies c
            WHERE ($1::text IS NULL
                   OR c.name ILIKE '%' || $1 || '%'
                   OR c.unified_number ILIKE '%' || $1 || '%'
                   OR c.tax_number::text ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR c.company_type = $2)
            "#,
        )
        .bind(search)
        .bind(&filter.company_type)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CompanyWithCountEntity>(
            r#"
            SELECT c.*,
                   (SELECT COUNT(*) FROM employees e WHERE e.company_id = c.id) AS employee_count
            FROM companies c
            WHERE ($1::text IS NULL
                   OR c.name ILIKE '%' || $1 || '%'
                   OR c.unified_number ILIKE '%' || $1 || '%'
                   OR c.tax_number::text ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR c.company_type = $2)
            ORDER BY c.name ASC, c.id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(search)
        .bind(&filter.company_type)
        .bind(page.map(|p| p.limit()))
        .bind(page.map(|p| p.offset()).unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;
        timer.record();

        let companies = rows
            .into_iter()
            .map(|row| (row.company.into(), row.employee_count))
            .collect();
        Ok((companies, total))
    }

    /// Every company, for alert generation, search and export.
    pub async fn list_all(&self) -> Result<Vec<Company>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_companies");
        let rows = sqlx::query_as::<_, CompanyEntity>(
            r#"SELECT * FROM companies ORDER BY name ASC, id ASC"#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(rows?.into_iter().map(Into::into).collect())
    }

    /// Finds a company together with its employee count.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<(Company, i64)>, sqlx::Error> {
        let timer = QueryTimer::new("find_company_by_id");
        let row = sqlx::query_as::<_, CompanyWithCountEntity>(
            r#"
            SELECT c.*,
                   (SELECT COUNT(*) FROM employees e WHERE e.company_id = c.id) AS employee_count
            FROM companies c
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(row?.map(|r| (r.company.into(), r.employee_count)))
    }

    /// Import key lookup.
    pub async fn find_by_unified_number(
        &self,
        unified_number: &str,
    ) -> Result<Option<Company>, sqlx::Error> {
        let timer = QueryTimer::new("find_company_by_unified_number");
        let row = sqlx::query_as::<_, CompanyEntity>(
            r#"SELECT * FROM companies WHERE unified_number = $1"#,
        )
        .bind(unified_number)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(row?.map(Into::into))
    }

    pub async fn create(&self, input: &CompanyInput) -> Result<Company, sqlx::Error> {
        let timer = QueryTimer::new("create_company");
        let query = sqlx::query_as::<_, CompanyEntity>(
            r#"
            INSERT INTO companies (
                name, tax_number, unified_number, labor_subscription_number, company_type,
                commercial_registration_expiry, social_insurance_expiry,
                power_subscription_expiry, moqeem_subscription_expiry,
                max_employees, additional_fields, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        );
        let entity = bind_company_input!(query, input)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        Ok(entity?.into())
    }

    /// Replaces every editable column. Returns `None` if the company is gone.
    pub async fn update(
        &self,
        id: Uuid,
        input: &CompanyInput,
    ) -> Result<Option<Company>, sqlx::Error> {
        let timer = QueryTimer::new("update_company");
        let query = sqlx::query_as::<_, CompanyEntity>(
            r#"
            UPDATE companies SET
                name = $2,
                tax_number = $3,
                unified_number = $4,
                labor_subscription_number = $5,
                company_type = $6,
                commercial_registration_expiry = $7,
                social_insurance_expiry = $8,
                power_subscription_expiry = $9,
                moqeem_subscription_expiry = $10,
                max_employees = $11,
                additional_fields = $12,
                notes = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id);
        let entity = bind_company_input!(query, input)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(entity?.map(Into::into))
    }

    /// Deletes a company without deleting its employees.
    ///
    /// Employees are detached first, in the same transaction, so a failed
    /// delete leaves every assignment intact.
    pub async fn safe_delete(&self, id: Uuid) -> Result<Option<CompanyDeletion>, sqlx::Error> {
        let timer = QueryTimer::new("safe_delete_company");
        let mut tx = self.pool.begin().await?;

        let unassigned = sqlx::query(
            r#"
            UPDATE employees
            SET company_id = NULL, updated_at = NOW()
            WHERE company_id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query(r#"DELETE FROM companies WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        tx.commit().await?;
        timer.record();

        Ok(Some(CompanyDeletion {
            company_id: id,
            unassigned_employees: unassigned,
        }))
    }

    /// Current number of employees assigned to the company.
    pub async fn count_employees(&self, id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_company_employees");
        let count = sqlx::query_scalar(r#"SELECT COUNT(*) FROM employees WHERE company_id = $1"#)
            .bind(id)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        count
    }

    /// Distinct non-empty company types, for filter dropdowns.
    pub async fn list_company_types(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT DISTINCT company_type FROM companies
            WHERE company_type IS NOT NULL AND company_type <> ''
            ORDER BY company_type
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
