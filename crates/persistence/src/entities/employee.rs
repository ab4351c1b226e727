//! Employee entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the employees table.
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeEntity {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub profession: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub passport_number: Option<String>,
    pub residence_number: String,
    pub joining_date: Option<NaiveDate>,
    pub contract_expiry: Option<NaiveDate>,
    pub residence_expiry: Option<NaiveDate>,
    pub health_insurance_expiry: Option<NaiveDate>,
    pub hired_worker_contract_expiry: Option<NaiveDate>,
    pub project_name: Option<String>,
    pub bank_account: Option<String>,
    pub employee_number: Option<String>,
    pub insurance_number: Option<String>,
    pub salary: Option<f64>,
    pub residence_image_url: Option<String>,
    pub additional_fields: JsonValue,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employee row joined with the owning company's name.
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeWithCompanyEntity {
    #[sqlx(flatten)]
    pub employee: EmployeeEntity,
    pub company_name: Option<String>,
}

impl From<EmployeeEntity> for domain::models::Employee {
    fn from(entity: EmployeeEntity) -> Self {
        Self {
            id: entity.id,
            company_id: entity.company_id,
            project_id: entity.project_id,
            name: entity.name,
            profession: entity.profession,
            nationality: entity.nationality,
            birth_date: entity.birth_date,
            phone: entity.phone,
            passport_number: entity.passport_number,
            residence_number: entity.residence_number,
            joining_date: entity.joining_date,
            contract_expiry: entity.contract_expiry,
            residence_expiry: entity.residence_expiry,
            health_insurance_expiry: entity.health_insurance_expiry,
            hired_worker_contract_expiry: entity.hired_worker_contract_expiry,
            project_name: entity.project_name,
            bank_account: entity.bank_account,
            employee_number: entity.employee_number,
            insurance_number: entity.insurance_number,
            salary: entity.salary,
            residence_image_url: entity.residence_image_url,
            additional_fields: entity.additional_fields,
            notes: entity.notes,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<EmployeeWithCompanyEntity> for (domain::models::Employee, Option<String>) {
    fn from(entity: EmployeeWithCompanyEntity) -> Self {
        (entity.employee.into(), entity.company_name)
    }
}
