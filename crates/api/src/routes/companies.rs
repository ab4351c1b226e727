//! Company routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use domain::models::company::{CompanyDeletion, ListCompaniesQuery};
use domain::models::{
    classify, ActivityAction, Company, CompanyInput, CompanyResponse, DocumentOwner,
    DocumentType, EntityType, HasDocuments, PageRequest, Paginated, PermissionAction,
    PermissionSection, ThresholdSettings,
};
use persistence::repositories::{ActivityLogRepository, CompanyListFilter, CompanyRepository};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::capacity::ensure_limit_covers_headcount;

const COMPANY_NOT_FOUND: &str = "المؤسسة غير موجودة";

/// `true` when the company matches the requested document status. Without a
/// document type any company document may match.
fn matches_status(company: &Company, query: &ListCompaniesQuery, thresholds: &ThresholdSettings, today: NaiveDate) -> bool {
    let Some(status) = query.status else {
        return true;
    };
    let mut documents = DocumentType::for_owner(DocumentOwner::Company)
        .filter(|doc| query.document.map_or(true, |d| d == *doc));
    documents.any(|doc| classify(company.expiry_for(doc), &thresholds.get(doc), today) == status)
}

/// List companies.
///
/// GET /api/v1/companies
pub async fn list_companies(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListCompaniesQuery>,
) -> Result<Json<Paginated<CompanyResponse>>, ApiError> {
    current.require(PermissionSection::Companies, PermissionAction::View)?;

    if let Some(document) = query.document {
        if document.owner() != DocumentOwner::Company {
            return Err(ApiError::validation("نوع المستند لا يخص المؤسسات"));
        }
    }

    let repo = CompanyRepository::new(state.pool.clone());
    let thresholds = state.thresholds.get().await?;
    let today = state.today();
    let page = PageRequest::new(query.page, query.per_page);
    let filter = CompanyListFilter {
        search: query.search.clone(),
        company_type: query.company_type.clone(),
    };

    // status depends on thresholds, so that filter runs here and pages in memory
    let (rows, total) = if query.status.is_some() {
        let (all, _) = repo.list(&filter, None).await?;
        let matching: Vec<(Company, i64)> = all
            .into_iter()
            .filter(|(c, _)| matches_status(c, &query, &thresholds, today))
            .collect();
        let total = matching.len() as i64;
        let rows = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        (rows, total)
    } else {
        repo.list(&filter, Some(page)).await?
    };

    let data = rows
        .into_iter()
        .map(|(company, count)| CompanyResponse::build(company, count, &thresholds, today))
        .collect();

    Ok(Json(Paginated::new(data, page, total)))
}

/// Distinct company types for the filter dropdown.
///
/// GET /api/v1/companies/types
pub async fn list_company_types(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<String>>, ApiError> {
    current.require(PermissionSection::Companies, PermissionAction::View)?;
    let types = CompanyRepository::new(state.pool.clone())
        .list_company_types()
        .await?;
    Ok(Json(types))
}

/// GET /api/v1/companies/:company_id
pub async fn get_company(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, ApiError> {
    current.require(PermissionSection::Companies, PermissionAction::View)?;

    let (company, count) = CompanyRepository::new(state.pool.clone())
        .find_by_id(company_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(COMPANY_NOT_FOUND.to_string()))?;
    let thresholds = state.thresholds.get().await?;

    Ok(Json(CompanyResponse::build(company, count, &thresholds, state.today())))
}

/// POST /api/v1/companies
pub async fn create_company(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<CompanyInput>,
) -> Result<(StatusCode, Json<CompanyResponse>), ApiError> {
    current.require(PermissionSection::Companies, PermissionAction::Create)?;

    let input = input.normalized();
    input.validate()?;

    let company = CompanyRepository::new(state.pool.clone())
        .create(&input)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Create, EntityType::Company)
            .on_entity(company.id)
            .with_name(company.name.clone())
            .build(),
    );
    info!(company_id = %company.id, user_id = %current.id, "Company created");

    let thresholds = state.thresholds.get().await?;
    Ok((
        StatusCode::CREATED,
        Json(CompanyResponse::build(company, 0, &thresholds, state.today())),
    ))
}

/// Full replacement of the editable fields.
///
/// PUT /api/v1/companies/:company_id
pub async fn update_company(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(company_id): Path<Uuid>,
    Json(input): Json<CompanyInput>,
) -> Result<Json<CompanyResponse>, ApiError> {
    current.require(PermissionSection::Companies, PermissionAction::Edit)?;

    let input = input.normalized();
    input.validate()?;

    let repo = CompanyRepository::new(state.pool.clone());
    let (before, count) = repo
        .find_by_id(company_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(COMPANY_NOT_FOUND.to_string()))?;

    ensure_limit_covers_headcount(input.max_employees, count)?;

    let company = repo
        .update(company_id, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound(COMPANY_NOT_FOUND.to_string()))?;

    let mut entry = current
        .activity(ActivityAction::Update, EntityType::Company)
        .on_entity(company.id)
        .with_name(company.name.clone());
    if before.name != company.name {
        entry = entry.with_change("name", before.name.as_str(), company.name.as_str());
    }
    if before.max_employees != company.max_employees {
        entry = entry.with_change("max_employees", json!(before.max_employees), json!(company.max_employees));
    }
    ActivityLogRepository::new(state.pool.clone()).insert_async(entry.build());
    info!(company_id = %company.id, user_id = %current.id, "Company updated");

    let thresholds = state.thresholds.get().await?;
    Ok(Json(CompanyResponse::build(company, count, &thresholds, state.today())))
}

/// Deletes the company after unassigning its employees.
///
/// DELETE /api/v1/companies/:company_id
pub async fn delete_company(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyDeletion>, ApiError> {
    current.require(PermissionSection::Companies, PermissionAction::Delete)?;

    let deletion = CompanyRepository::new(state.pool.clone())
        .safe_delete(company_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(COMPANY_NOT_FOUND.to_string()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Delete, EntityType::Company)
            .on_entity(company_id)
            .with_detail("unassigned_employees", deletion.unassigned_employees)
            .build(),
    );
    info!(
        company_id = %company_id,
        unassigned_employees = deletion.unassigned_employees,
        user_id = %current.id,
        "Company deleted"
    );

    Ok(Json(deletion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::ExpiryStatus;

    fn company(commercial: Option<NaiveDate>, moqeem: Option<NaiveDate>) -> Company {
        Company {
            id: Uuid::new_v4(),
            name: "مؤسسة".to_string(),
            tax_number: None,
            unified_number: None,
            labor_subscription_number: None,
            company_type: None,
            commercial_registration_expiry: commercial,
            social_insurance_expiry: None,
            power_subscription_expiry: None,
            moqeem_subscription_expiry: moqeem,
            max_employees: None,
            additional_fields: json!({}),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn query(document: Option<DocumentType>, status: Option<ExpiryStatus>) -> ListCompaniesQuery {
        ListCompaniesQuery {
            document,
            status,
            ..ListCompaniesQuery::default()
        }
    }

    #[test]
    fn test_status_filter() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let thresholds = ThresholdSettings::default();
        let c = company(NaiveDate::from_ymd_opt(2024, 5, 1), NaiveDate::from_ymd_opt(2025, 1, 1));

        assert!(matches_status(&c, &query(None, None), &thresholds, today));
        assert!(matches_status(&c, &query(None, Some(ExpiryStatus::Expired)), &thresholds, today));
        assert!(matches_status(&c, &query(None, Some(ExpiryStatus::NoExpiry)), &thresholds, today));
        assert!(!matches_status(
            &c,
            &query(Some(DocumentType::MoqeemSubscription), Some(ExpiryStatus::Expired)),
            &thresholds,
            today
        ));
        assert!(matches_status(
            &c,
            &query(Some(DocumentType::CommercialRegistration), Some(ExpiryStatus::Expired)),
            &thresholds,
            today
        ));
    }
}
