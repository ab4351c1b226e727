//! Employee repository for database operations.

use domain::models::{Employee, EmployeeInput, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EmployeeEntity, EmployeeWithCompanyEntity};
use crate::metrics::QueryTimer;

/// Filters for employee listings.
#[derive(Debug, Clone, Default)]
pub struct EmployeeListFilter {
    pub search: Option<String>,
    pub company_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    /// Only employees without a company.
    pub unassigned: bool,
}

/// Binds every column of an [`EmployeeInput`] in table order.
macro_rules! bind_employee_input {
    ($builder:expr, $input:expr) => {{
        $builder
            .bind($input.company_id)
            .bind($input.project_id)
            .bind(&$input.name)
            .bind(&$input.profession)
            .bind(&$input.nationality)
            .bind($input.birth_date)
            .bind(&$input.phone)
            .bind(&$input.passport_number)
            .bind(&$input.residence_number)
            .bind($input.joining_date)
            .bind($input.contract_expiry)
            .bind($input.residence_expiry)
            .bind($input.health_insurance_expiry)
            .bind($input.hired_worker_contract_expiry)
            .bind(&$input.project_name)
            .bind(&$input.bank_account)
            .bind(&$input.employee_number)
            .bind(&$input.insurance_number)
            .bind($input.salary)
            .bind(&$input.residence_image_url)
            .bind(&$input.additional_fields)
            .bind(&$input.notes)
    }};
}

/// Repository for employee database operations.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists employees with their company names, ordered by name.
    pub async fn list(
        &self,
        filter: &EmployeeListFilter,
        page: PageRequest,
    ) -> Result<(Vec<(Employee, Option<String>)>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_employees");
        let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM employees e
            WHERE ($1::text IS NULL
                   OR e.name ILIKE '%' || $1 || '%'
                   OR e.residence_number LIKE '%' || $1 || '%'
                   OR e.passport_number ILIKE '%' || $1 || '%'
                   OR e.phone LIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR e.company_id = $2)
              AND ($3::uuid IS NULL OR e.project_id = $3)
              AND ($4::text IS NULL OR e.nationality = $4)
              AND ($5::text IS NULL OR e.profession = $5)
              AND (NOT $6 OR e.company_id IS NULL)
            "#,
        )
        .bind(search)
        .bind(filter.company_id)
        .bind(filter.project_id)
        .bind(&filter.nationality)
        .bind(&filter.profession)
        .bind(filter.unassigned)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, EmployeeWithCompanyEntity>(
            r#"
            SELECT e.*, c.name AS company_name
            FROM employees e
            LEFT JOIN companies c ON c.id = e.company_id
            WHERE ($1::text IS NULL
                   OR e.name ILIKE '%' || $1 || '%'
                   OR e.residence_number LIKE '%' || $1 || '%'
                   OR e.passport_number ILIKE '%' || $1 || '%'
                   OR e.phone LIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR e.company_id = $2)
              AND ($3::uuid IS NULL OR e.project_id = $3)
              AND ($4::text IS NULL OR e.nationality = $4)
              AND ($5::text IS NULL OR e.profession = $5)
              AND (NOT $6 OR e.company_id IS NULL)
            ORDER BY e.name ASC, e.id ASC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(search)
        .bind(filter.company_id)
        .bind(filter.project_id)
        .bind(&filter.nationality)
        .bind(&filter.profession)
        .bind(filter.unassigned)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        timer.record();

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Every employee with the company name, for alerts, search and export.
    pub async fn list_all_with_company_name(
        &self,
    ) -> Result<Vec<(Employee, Option<String>)>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_employees");
        let rows = sqlx::query_as::<_, EmployeeWithCompanyEntity>(
            r#"
            SELECT e.*, c.name AS company_name
            FROM employees e
            LEFT JOIN companies c ON c.id = e.company_id
            ORDER BY e.name ASC, e.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(rows?.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<(Employee, Option<String>)>, sqlx::Error> {
        let timer = QueryTimer::new("find_employee_by_id");
        let row = sqlx::query_as::<_, EmployeeWithCompanyEntity>(
            r#"
            SELECT e.*, c.name AS company_name
            FROM employees e
            LEFT JOIN companies c ON c.id = e.company_id
            WHERE e.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(row?.map(Into::into))
    }

    /// Import key lookup.
    pub async fn find_by_residence_number(
        &self,
        residence_number: &str,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let timer = QueryTimer::new("find_employee_by_residence_number");
        let row = sqlx::query_as::<_, EmployeeEntity>(
            r#"SELECT * FROM employees WHERE residence_number = $1"#,
        )
        .bind(residence_number)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(row?.map(Into::into))
    }

    pub async fn create(&self, input: &EmployeeInput) -> Result<Employee, sqlx::Error> {
        let timer = QueryTimer::new("create_employee");
        let query = sqlx::query_as::<_, EmployeeEntity>(
            r#"
            INSERT INTO employees (
                company_id, project_id, name, profession, nationality, birth_date, phone,
                passport_number, residence_number, joining_date, contract_expiry,
                residence_expiry, health_insurance_expiry, hired_worker_contract_expiry,
                project_name, bank_account, employee_number, insurance_number, salary,
                residence_image_url, additional_fields, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22)
            RETURNING *
            "#,
        );
        let entity = bind_employee_input!(query, input)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        Ok(entity?.into())
    }

    /// Replaces every editable column. Returns `None` if the employee is gone.
    pub async fn update(
        &self,
        id: Uuid,
        input: &EmployeeInput,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let timer = QueryTimer::new("update_employee");
        let query = sqlx::query_as::<_, EmployeeEntity>(
            r#"
            UPDATE employees SET
                company_id = $2,
                project_id = $3,
                name = $4,
                profession = $5,
                nationality = $6,
                birth_date = $7,
                phone = $8,
                passport_number = $9,
                residence_number = $10,
                joining_date = $11,
                contract_expiry = $12,
                residence_expiry = $13,
                health_insurance_expiry = $14,
                hired_worker_contract_expiry = $15,
                project_name = $16,
                bank_account = $17,
                employee_number = $18,
                insurance_number = $19,
                salary = $20,
                residence_image_url = $21,
                additional_fields = $22,
                notes = $23,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id);
        let entity = bind_employee_input!(query, input)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(entity?.map(Into::into))
    }

    /// Returns `true` if a row was deleted.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_employee");
        let result = sqlx::query(r#"DELETE FROM employees WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Number of employees with no company.
    pub async fn count_unassigned(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM employees WHERE company_id IS NULL"#)
            .fetch_one(&self.pool)
            .await
    }
}
