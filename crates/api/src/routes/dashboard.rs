//! Dashboard statistics route.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use domain::models::dashboard::{DashboardStats, StatusBreakdown};
use domain::models::{
    classify, AlertStats, Company, DocumentOwner, DocumentType, Employee, HasDocuments,
    PermissionAction, PermissionSection, ThresholdSettings,
};
use domain::services::alerts::{company_alerts, employee_alerts, mark_read, sort_alerts};
use persistence::repositories::{
    CompanyRepository, DashboardRepository, EmployeeRepository, ReadAlertRepository,
};
use std::collections::BTreeMap;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

fn tally<T: HasDocuments>(
    holders: &[T],
    owner: DocumentOwner,
    thresholds: &ThresholdSettings,
    today: NaiveDate,
    out: &mut BTreeMap<DocumentType, StatusBreakdown>,
) {
    for document in DocumentType::for_owner(owner) {
        let breakdown = out.entry(document).or_default();
        let limits = thresholds.get(document);
        for holder in holders {
            breakdown.add(classify(holder.expiry_for(document), &limits, today));
        }
    }
}

/// Band counts for every document type across all employees and companies.
pub(crate) fn document_breakdown(
    employees: &[Employee],
    companies: &[Company],
    thresholds: &ThresholdSettings,
    today: NaiveDate,
) -> BTreeMap<DocumentType, StatusBreakdown> {
    let mut out = BTreeMap::new();
    tally(employees, DocumentOwner::Employee, thresholds, today, &mut out);
    tally(companies, DocumentOwner::Company, thresholds, today, &mut out);
    out
}

/// GET /api/v1/dashboard/stats
pub async fn get_stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<DashboardStats>, ApiError> {
    current.require(PermissionSection::Dashboard, PermissionAction::View)?;

    let totals = DashboardRepository::new(state.pool.clone()).totals().await?;
    let thresholds = state.thresholds.get().await?;
    let employees = EmployeeRepository::new(state.pool.clone())
        .list_all_with_company_name()
        .await?;
    let companies = CompanyRepository::new(state.pool.clone()).list_all().await?;
    let read_ids = ReadAlertRepository::new(state.pool.clone())
        .read_ids(current.id)
        .await?;
    let today = state.today();

    let mut alerts = employee_alerts(&employees, &thresholds, today);
    alerts.extend(company_alerts(&companies, &thresholds, today));
    sort_alerts(&mut alerts);
    mark_read(&mut alerts, &read_ids);

    let employee_rows: Vec<Employee> = employees.into_iter().map(|(e, _)| e).collect();

    Ok(Json(DashboardStats {
        total_companies: totals.companies,
        total_employees: totals.employees,
        total_projects: totals.projects,
        unassigned_employees: totals.unassigned_employees,
        documents: document_breakdown(&employee_rows, &companies, &thresholds, today),
        alerts: AlertStats::from_alerts(&alerts),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn employee(residence_days: Option<i64>) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            company_id: None,
            project_id: None,
            name: "سالم".to_string(),
            profession: None,
            nationality: None,
            birth_date: None,
            phone: None,
            passport_number: None,
            residence_number: "2100000001".to_string(),
            joining_date: None,
            contract_expiry: None,
            hired_worker_contract_expiry: None,
            residence_expiry: residence_days.map(|d| today() + Duration::days(d)),
            project_name: None,
            bank_account: None,
            employee_number: None,
            insurance_number: None,
            residence_image_url: None,
            health_insurance_expiry: None,
            salary: None,
            notes: None,
            additional_fields: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_breakdown_counts_every_record_per_document() {
        let employees = vec![employee(Some(-1)), employee(Some(3)), employee(None)];
        let stats = document_breakdown(&employees, &[], &ThresholdSettings::default(), today());

        let residence = &stats[&DocumentType::Residence];
        assert_eq!(residence.expired, 1);
        assert_eq!(residence.urgent, 1);
        assert_eq!(residence.no_expiry, 1);

        let contract = &stats[&DocumentType::Contract];
        assert_eq!(contract.no_expiry, 3);

        // company documents are present even with no companies
        assert_eq!(
            stats[&DocumentType::CommercialRegistration],
            StatusBreakdown::default()
        );
    }
}
