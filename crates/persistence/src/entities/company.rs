//! Company entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the companies table.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyEntity {
    pub id: Uuid,
    pub name: String,
    pub tax_number: Option<i64>,
    pub unified_number: Option<String>,
    pub labor_subscription_number: Option<String>,
    pub company_type: Option<String>,
    pub commercial_registration_expiry: Option<NaiveDate>,
    pub social_insurance_expiry: Option<NaiveDate>,
    pub power_subscription_expiry: Option<NaiveDate>,
    pub moqeem_subscription_expiry: Option<NaiveDate>,
    pub max_employees: Option<i32>,
    pub additional_fields: JsonValue,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company row joined with its current employee count.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyWithCountEntity {
    #[sqlx(flatten)]
    pub company: CompanyEntity,
    pub employee_count: i64,
}

impl From<CompanyEntity> for domain::models::Company {
    fn from(entity: CompanyEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            tax_number: entity.tax_number,
            unified_number: entity.unified_number,
            labor_subscription_number: entity.labor_subscription_number,
            company_type: entity.company_type,
            commercial_registration_expiry: entity.commercial_registration_expiry,
            social_insurance_expiry: entity.social_insurance_expiry,
            power_subscription_expiry: entity.power_subscription_expiry,
            moqeem_subscription_expiry: entity.moqeem_subscription_expiry,
            max_employees: entity.max_employees,
            additional_fields: entity.additional_fields,
            notes: entity.notes,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_to_domain() {
        let now = Utc::now();
        let entity = CompanyEntity {
            id: Uuid::new_v4(),
            name: "مؤسسة النخبة".to_string(),
            tax_number: Some(55),
            unified_number: Some("7000000001".to_string()),
            labor_subscription_number: None,
            company_type: None,
            commercial_registration_expiry: NaiveDate::from_ymd_opt(2025, 3, 1),
            social_insurance_expiry: None,
            power_subscription_expiry: None,
            moqeem_subscription_expiry: None,
            max_employees: Some(10),
            additional_fields: json!({"branch": "الرياض"}),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let id = entity.id;
        let company: domain::models::Company = entity.into();
        assert_eq!(company.id, id);
        assert_eq!(company.max_employees, Some(10));
        assert_eq!(company.additional_fields["branch"], "الرياض");
    }
}
