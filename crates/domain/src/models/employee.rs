//! Employee domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use shared::validation::{validate_phone, validate_residence_number};
use uuid::Uuid;
use validator::Validate;

use super::company::empty_object;
use super::expiry::{DocumentOwner, DocumentStatus, DocumentType, ExpiryStatus, HasDocuments};
use super::setting::ThresholdSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Employee {
    pub id: Uuid,
    /// Cleared when the company is deleted.
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

impl HasDocuments for Employee {
    fn expiry_for(&self, document: DocumentType) -> Option<NaiveDate> {
        match document {
            DocumentType::Residence => self.residence_expiry,
            DocumentType::Contract => self.contract_expiry,
            DocumentType::HealthInsurance => self.health_insurance_expiry,
            DocumentType::HiredWorkerContract => self.hired_worker_contract_expiry,
            _ => None,
        }
    }
}

impl Employee {
    pub fn document_statuses(
        &self,
        thresholds: &ThresholdSettings,
        today: NaiveDate,
    ) -> Vec<DocumentStatus> {
        DocumentType::for_owner(DocumentOwner::Employee)
            .map(|doc| {
                DocumentStatus::evaluate(doc, self.expiry_for(doc), &thresholds.get(doc), today)
            })
            .collect()
    }

    /// Worst band across the employee's documents, ignoring missing dates.
    pub fn overall_status(&self, thresholds: &ThresholdSettings, today: NaiveDate) -> ExpiryStatus {
        self.document_statuses(thresholds, today)
            .into_iter()
            .map(|s| s.status)
            .min()
            .unwrap_or(ExpiryStatus::NoExpiry)
    }
}

/// Employee joined with the owning company's name and per-document status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub employee: Employee,
    pub company_name: Option<String>,
    pub overall_status: ExpiryStatus,
    pub documents: Vec<DocumentStatus>,
}

impl EmployeeResponse {
    pub fn build(
        employee: Employee,
        company_name: Option<String>,
        thresholds: &ThresholdSettings,
        today: NaiveDate,
    ) -> Self {
        let documents = employee.document_statuses(thresholds, today);
        let overall_status = documents
            .iter()
            .map(|s| s.status)
            .min()
            .unwrap_or(ExpiryStatus::NoExpiry);
        Self {
            employee,
            company_name,
            overall_status,
            documents,
        }
    }
}

/// Create/replace payload for an employee.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct EmployeeInput {
    pub company_id: Option<Uuid>,
    pub project_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "اسم الموظف مطلوب"))]
    pub name: String,

    #[validate(length(max = 100))]
    pub profession: Option<String>,

    #[validate(length(max = 100))]
    pub nationality: Option<String>,

    pub birth_date: Option<NaiveDate>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(length(max = 50))]
    pub passport_number: Option<String>,

    #[validate(custom(function = "validate_residence_number"))]
    pub residence_number: String,

    pub joining_date: Option<NaiveDate>,
    pub contract_expiry: Option<NaiveDate>,
    pub residence_expiry: Option<NaiveDate>,
    pub health_insurance_expiry: Option<NaiveDate>,
    pub hired_worker_contract_expiry: Option<NaiveDate>,

    #[validate(length(max = 255))]
    pub project_name: Option<String>,

    #[validate(length(max = 64))]
    pub bank_account: Option<String>,

    #[validate(length(max = 50))]
    pub employee_number: Option<String>,

    #[validate(length(max = 50))]
    pub insurance_number: Option<String>,

    #[validate(range(min = 0.0, message = "الراتب لا يمكن أن يكون سالباً"))]
    pub salary: Option<f64>,

    #[validate(url)]
    pub residence_image_url: Option<String>,

    #[serde(default = "empty_object")]
    pub additional_fields: JsonValue,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl EmployeeInput {
    pub fn normalized(mut self) -> Self {
        use shared::validation::normalize_optional;
        self.name = self.name.trim().to_string();
        self.residence_number = self.residence_number.trim().to_string();
        for field in [
            &mut self.profession,
            &mut self.nationality,
            &mut self.phone,
            &mut self.passport_number,
            &mut self.project_name,
            &mut self.bank_account,
            &mut self.employee_number,
            &mut self.insurance_number,
            &mut self.residence_image_url,
            &mut self.notes,
        ] {
            *field = normalize_optional(field.as_deref());
        }
        if !self.additional_fields.is_object() {
            self.additional_fields = empty_object();
        }
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListEmployeesQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub company_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub nationality: Option<String>,
    pub profession: Option<String>,
    /// Only employees without a company.
    #[serde(default)]
    pub unassigned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn employee() -> Employee {
        Employee {
            id: Uuid::new_v4(),
            company_id: None,
            project_id: None,
            name: "أحمد علي".to_string(),
            profession: Some("مهندس".to_string()),
            nationality: Some("مصري".to_string()),
            birth_date: None,
            phone: Some("0551234567".to_string()),
            passport_number: None,
            residence_number: "2123456789".to_string(),
            joining_date: None,
            contract_expiry: NaiveDate::from_ymd_opt(2024, 6, 20),
            residence_expiry: NaiveDate::from_ymd_opt(2024, 6, 10),
            health_insurance_expiry: NaiveDate::from_ymd_opt(2024, 6, 25),
            hired_worker_contract_expiry: None,
            project_name: None,
            bank_account: None,
            employee_number: None,
            insurance_number: None,
            salary: Some(5000.0),
            residence_image_url: None,
            additional_fields: json!({}),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input() -> EmployeeInput {
        serde_json::from_value(json!({
            "company_id": null,
            "project_id": null,
            "name": "سالم",
            "profession": null,
            "nationality": null,
            "birth_date": null,
            "phone": "+966551234567",
            "passport_number": null,
            "residence_number": "2123456789",
            "joining_date": null,
            "contract_expiry": null,
            "residence_expiry": "2025-01-01",
            "health_insurance_expiry": null,
            "hired_worker_contract_expiry": null,
            "project_name": null,
            "bank_account": null,
            "employee_number": null,
            "insurance_number": null,
            "salary": null,
            "residence_image_url": null,
            "notes": null
        }))
        .unwrap()
    }

    #[test]
    fn test_document_statuses_use_per_document_thresholds() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let e = employee();
        let statuses = e.document_statuses(&ThresholdSettings::default(), today);
        let find = |doc| statuses.iter().find(|s| s.document == doc).unwrap().status;

        assert_eq!(find(DocumentType::Residence), ExpiryStatus::High);
        assert_eq!(find(DocumentType::Contract), ExpiryStatus::Medium);
        // 24 days out, inside the 30-day urgent window for health insurance
        assert_eq!(find(DocumentType::HealthInsurance), ExpiryStatus::Urgent);
        assert_eq!(find(DocumentType::HiredWorkerContract), ExpiryStatus::NoExpiry);
        assert_eq!(
            e.overall_status(&ThresholdSettings::default(), today),
            ExpiryStatus::Urgent
        );
    }

    #[test]
    fn test_expiry_for_ignores_company_documents() {
        assert!(employee().expiry_for(DocumentType::CommercialRegistration).is_none());
    }

    #[test]
    fn test_response_serializes_flat() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let r = EmployeeResponse::build(
            employee(),
            Some("مؤسسة".to_string()),
            &ThresholdSettings::default(),
            today,
        );
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["residence_number"], "2123456789");
        assert_eq!(json["company_name"], "مؤسسة");
        assert_eq!(json["overall_status"], "urgent");
        assert_eq!(json["documents"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_input_validation() {
        assert!(input().validate().is_ok());

        let mut bad = input();
        bad.residence_number = "123".to_string();
        assert!(bad
            .validate()
            .unwrap_err()
            .field_errors()
            .contains_key("residence_number"));

        let mut bad = input();
        bad.salary = Some(-1.0);
        assert!(bad.validate().is_err());

        let mut bad = input();
        bad.phone = Some("abc".to_string());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_input_normalized() {
        let mut raw = input();
        raw.profession = Some("لا يوجد".to_string());
        raw.nationality = Some(" هندي ".to_string());
        let n = raw.normalized();
        assert!(n.profession.is_none());
        assert_eq!(n.nationality.as_deref(), Some("هندي"));
        assert!(n.additional_fields.is_object());
    }
}
