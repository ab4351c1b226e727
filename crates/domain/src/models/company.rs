//! Company (establishment) domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use shared::validation::{validate_labor_subscription, validate_unified_number};
use uuid::Uuid;
use validator::Validate;

use super::expiry::{DocumentOwner, DocumentStatus, DocumentType, HasDocuments};
use super::setting::ThresholdSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    /// Social insurance subscriber number.
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

impl HasDocuments for Company {
    fn expiry_for(&self, document: DocumentType) -> Option<NaiveDate> {
        match document {
            DocumentType::CommercialRegistration => self.commercial_registration_expiry,
            DocumentType::SocialInsurance => self.social_insurance_expiry,
            DocumentType::PowerSubscription => self.power_subscription_expiry,
            DocumentType::MoqeemSubscription => self.moqeem_subscription_expiry,
            _ => None,
        }
    }
}

impl Company {
    pub fn document_statuses(
        &self,
        thresholds: &ThresholdSettings,
        today: NaiveDate,
    ) -> Vec<DocumentStatus> {
        DocumentType::for_owner(DocumentOwner::Company)
            .map(|doc| {
                DocumentStatus::evaluate(doc, self.expiry_for(doc), &thresholds.get(doc), today)
            })
            .collect()
    }
}

/// Company with employee count and per-document status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CompanyResponse {
    #[serde(flatten)]
    pub company: Company,
    pub employee_count: i64,
    pub available_slots: Option<i64>,
    pub documents: Vec<DocumentStatus>,
}

impl CompanyResponse {
    pub fn build(
        company: Company,
        employee_count: i64,
        thresholds: &ThresholdSettings,
        today: NaiveDate,
    ) -> Self {
        let documents = company.document_statuses(thresholds, today);
        let available_slots = company
            .max_employees
            .map(|max| (i64::from(max) - employee_count).max(0));
        Self {
            company,
            employee_count,
            available_slots,
            documents,
        }
    }
}

/// Create/replace payload. Updates are full replacements, matching the edit
/// form which always submits every field.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CompanyInput {
    #[validate(length(min = 1, max = 255, message = "اسم المؤسسة مطلوب"))]
    pub name: String,

    #[validate(range(min = 1, message = "الرقم التأميني يجب أن يكون رقماً موجباً"))]
    pub tax_number: Option<i64>,

    #[validate(custom(function = "validate_unified_number"))]
    pub unified_number: Option<String>,

    #[validate(custom(function = "validate_labor_subscription"))]
    pub labor_subscription_number: Option<String>,

    #[validate(length(max = 100))]
    pub company_type: Option<String>,

    pub commercial_registration_expiry: Option<NaiveDate>,
    pub social_insurance_expiry: Option<NaiveDate>,
    pub power_subscription_expiry: Option<NaiveDate>,
    pub moqeem_subscription_expiry: Option<NaiveDate>,

    #[validate(range(min = 1, max = 10000, message = "الحد الأقصى للموظفين يجب أن يكون بين 1 و 10000"))]
    pub max_employees: Option<i32>,

    #[serde(default = "empty_object")]
    pub additional_fields: JsonValue,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl CompanyInput {
    /// Collapses blank strings and the "no value" literal to `None`.
    pub fn normalized(mut self) -> Self {
        use shared::validation::normalize_optional;
        self.name = self.name.trim().to_string();
        self.unified_number = normalize_optional(self.unified_number.as_deref());
        self.labor_subscription_number =
            normalize_optional(self.labor_subscription_number.as_deref());
        self.company_type = normalize_optional(self.company_type.as_deref());
        self.notes = normalize_optional(self.notes.as_deref());
        if !self.additional_fields.is_object() {
            self.additional_fields = empty_object();
        }
        self
    }
}

pub(crate) fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

/// Query parameters for listing companies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListCompaniesQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub company_type: Option<String>,
    /// Restrict to companies whose document of this type is in `status`.
    pub document: Option<DocumentType>,
    pub status: Option<super::expiry::ExpiryStatus>,
}

/// Result of a safe delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CompanyDeletion {
    pub company_id: Uuid,
    pub unassigned_employees: u64,
}
