//! Employee routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::employee::ListEmployeesQuery;
use domain::models::{
    ActivityAction, EmployeeInput, EmployeeResponse, EntityType, PageRequest, Paginated,
    PermissionAction, PermissionSection,
};
use persistence::repositories::{
    ActivityLogRepository, CompanyRepository, EmployeeListFilter, EmployeeRepository,
    ProjectRepository,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::capacity::ensure_company_has_room;

const EMPLOYEE_NOT_FOUND: &str = "الموظف غير موجود";

/// Normalizes the payload and copies the project name from `project_id`.
async fn prepare_input(state: &AppState, input: EmployeeInput) -> Result<EmployeeInput, ApiError> {
    let mut input = input.normalized();
    if let Some(project_id) = input.project_id {
        let project = ProjectRepository::new(state.pool.clone())
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| ApiError::validation("المشروع المحدد غير موجود"))?;
        input.project_name = Some(project.name);
    }
    input.validate()?;
    Ok(input)
}

async fn load_response(state: &AppState, employee_id: Uuid) -> Result<EmployeeResponse, ApiError> {
    let (employee, company_name) = EmployeeRepository::new(state.pool.clone())
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(EMPLOYEE_NOT_FOUND.to_string()))?;
    let thresholds = state.thresholds.get().await?;
    Ok(EmployeeResponse::build(employee, company_name, &thresholds, state.today()))
}

/// List employees.
///
/// GET /api/v1/employees
pub async fn list_employees(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListEmployeesQuery>,
) -> Result<Json<Paginated<EmployeeResponse>>, ApiError> {
    current.require(PermissionSection::Employees, PermissionAction::View)?;

    let page = PageRequest::new(query.page, query.per_page);
    let filter = EmployeeListFilter {
        search: query.search,
        company_id: query.company_id,
        project_id: query.project_id,
        nationality: query.nationality,
        profession: query.profession,
        unassigned: query.unassigned,
    };

    let (rows, total) = EmployeeRepository::new(state.pool.clone())
        .list(&filter, page)
        .await?;
    let thresholds = state.thresholds.get().await?;
    let today = state.today();

    let data = rows
        .into_iter()
        .map(|(employee, company_name)| {
            EmployeeResponse::build(employee, company_name, &thresholds, today)
        })
        .collect();

    Ok(Json(Paginated::new(data, page, total)))
}

/// GET /api/v1/employees/:employee_id
pub async fn get_employee(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(employee_id): Path<Uuid>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    current.require(PermissionSection::Employees, PermissionAction::View)?;
    Ok(Json(load_response(&state, employee_id).await?))
}

/// POST /api/v1/employees
///
/// Fails with 409 when the target company is already at `max_employees`.
pub async fn create_employee(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<EmployeeInput>,
) -> Result<(StatusCode, Json<EmployeeResponse>), ApiError> {
    current.require(PermissionSection::Employees, PermissionAction::Create)?;

    let input = prepare_input(&state, input).await?;
    ensure_company_has_room(
        &CompanyRepository::new(state.pool.clone()),
        input.company_id,
        None,
    )
    .await?;

    let employee = EmployeeRepository::new(state.pool.clone())
        .create(&input)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Create, EntityType::Employee)
            .on_entity(employee.id)
            .with_name(employee.name.clone())
            .with_detail("residence_number", employee.residence_number.clone())
            .build(),
    );
    info!(employee_id = %employee.id, user_id = %current.id, "Employee created");

    Ok((StatusCode::CREATED, Json(load_response(&state, employee.id).await?)))
}

/// PUT /api/v1/employees/:employee_id
pub async fn update_employee(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(employee_id): Path<Uuid>,
    Json(input): Json<EmployeeInput>,
) -> Result<Json<EmployeeResponse>, ApiError> {
    current.require(PermissionSection::Employees, PermissionAction::Edit)?;

    let input = prepare_input(&state, input).await?;
    let repo = EmployeeRepository::new(state.pool.clone());
    let (before, _) = repo
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(EMPLOYEE_NOT_FOUND.to_string()))?;

    ensure_company_has_room(
        &CompanyRepository::new(state.pool.clone()),
        input.company_id,
        before.company_id,
    )
    .await?;

    let employee = repo
        .update(employee_id, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound(EMPLOYEE_NOT_FOUND.to_string()))?;

    let entry = current
        .activity(ActivityAction::Update, EntityType::Employee)
        .on_entity(employee.id)
        .with_name(employee.name.clone())
        .with_change("company_id", json!(before.company_id), json!(employee.company_id))
        .with_change(
            "residence_expiry",
            json!(before.residence_expiry),
            json!(employee.residence_expiry),
        )
        .with_change("project_id", json!(before.project_id), json!(employee.project_id));
    ActivityLogRepository::new(state.pool.clone()).insert_async(entry.build());
    info!(employee_id = %employee.id, user_id = %current.id, "Employee updated");

    Ok(Json(load_response(&state, employee.id).await?))
}

/// DELETE /api/v1/employees/:employee_id
pub async fn delete_employee(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(employee_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    current.require(PermissionSection::Employees, PermissionAction::Delete)?;

    let repo = EmployeeRepository::new(state.pool.clone());
    let (employee, _) = repo
        .find_by_id(employee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(EMPLOYEE_NOT_FOUND.to_string()))?;
    if !repo.delete(employee_id).await? {
        return Err(ApiError::NotFound(EMPLOYEE_NOT_FOUND.to_string()));
    }

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Delete, EntityType::Employee)
            .on_entity(employee_id)
            .with_name(employee.name)
            .with_detail("residence_number", employee.residence_number)
            .build(),
    );
    info!(employee_id = %employee_id, user_id = %current.id, "Employee deleted");

    Ok(StatusCode::NO_CONTENT)
}
