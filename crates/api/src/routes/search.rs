//! Advanced search and saved search routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::saved_search::{CreateSavedSearchRequest, SavedSearch};
use domain::models::search::{SearchRequest, SearchResults};
use domain::models::{ActivityAction, EntityType, PermissionAction, PermissionSection};
use domain::services::search::search;
use persistence::repositories::{
    ActivityLogRepository, CompanyRepository, EmployeeRepository, SavedSearchRepository,
};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Fuzzy search over employees and companies with structured filters.
///
/// POST /api/v1/search
pub async fn run_search(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResults>, ApiError> {
    current.require(PermissionSection::AdvancedSearch, PermissionAction::View)?;
    request.validate()?;

    let employees = if request.search_type.includes_employees() {
        EmployeeRepository::new(state.pool.clone())
            .list_all_with_company_name()
            .await?
    } else {
        Vec::new()
    };
    let companies = if request.search_type.includes_companies() {
        CompanyRepository::new(state.pool.clone()).list_all().await?
    } else {
        Vec::new()
    };

    let results = search(&request, employees, companies, state.today());
    debug!(
        user_id = %current.id,
        search_type = request.search_type.as_str(),
        total = results.total,
        "Search executed"
    );
    Ok(Json(results))
}

/// GET /api/v1/saved-searches
pub async fn list_saved_searches(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<SavedSearch>>, ApiError> {
    current.require(PermissionSection::AdvancedSearch, PermissionAction::View)?;
    let searches = SavedSearchRepository::new(state.pool.clone())
        .list_for_user(current.id)
        .await?;
    Ok(Json(searches))
}

/// POST /api/v1/saved-searches
pub async fn create_saved_search(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateSavedSearchRequest>,
) -> Result<(StatusCode, Json<SavedSearch>), ApiError> {
    current.require(PermissionSection::AdvancedSearch, PermissionAction::View)?;
    request.validate()?;
    if request.name.trim().is_empty() {
        return Err(ApiError::validation("اسم البحث مطلوب"));
    }

    let saved = SavedSearchRepository::new(state.pool.clone())
        .create(current.id, &request)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Create, EntityType::SavedSearch)
            .on_entity(saved.id)
            .with_name(saved.name.clone())
            .build(),
    );
    info!(search_id = %saved.id, user_id = %current.id, "Saved search created");

    Ok((StatusCode::CREATED, Json(saved)))
}

/// Only the owner can delete a saved search; anything else is a 404.
///
/// DELETE /api/v1/saved-searches/:search_id
pub async fn delete_saved_search(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(search_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    current.require(PermissionSection::AdvancedSearch, PermissionAction::View)?;

    let deleted = SavedSearchRepository::new(state.pool.clone())
        .delete(search_id, current.id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("البحث المحفوظ غير موجود".to_string()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Delete, EntityType::SavedSearch)
            .on_entity(search_id)
            .build(),
    );

    Ok(StatusCode::NO_CONTENT)
}
