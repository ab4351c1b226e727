//! Project routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::project::ProjectInput;
use domain::models::{
    ActivityAction, EntityType, PermissionAction, PermissionSection, Project, ProjectWithCount,
};
use persistence::repositories::{ActivityLogRepository, ProjectRepository};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

const PROJECT_NOT_FOUND: &str = "المشروع غير موجود";

#[derive(Debug, Serialize)]
pub struct ProjectDeletion {
    pub project_id: Uuid,
    pub detached_employees: u64,
}

/// Projects with their employee counts, ordered by name.
///
/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<ProjectWithCount>>, ApiError> {
    current.require(PermissionSection::Projects, PermissionAction::View)?;
    let projects = ProjectRepository::new(state.pool.clone())
        .list_with_counts()
        .await?;
    Ok(Json(projects))
}

/// GET /api/v1/projects/:project_id
pub async fn get_project(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    current.require(PermissionSection::Projects, PermissionAction::View)?;
    let project = ProjectRepository::new(state.pool.clone())
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(PROJECT_NOT_FOUND.to_string()))?;
    Ok(Json(project))
}

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(mut input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    current.require(PermissionSection::Projects, PermissionAction::Create)?;

    input.name = input.name.trim().to_string();
    input.validate()?;

    let project = ProjectRepository::new(state.pool.clone())
        .create(&input)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Create, EntityType::Project)
            .on_entity(project.id)
            .with_name(project.name.clone())
            .build(),
    );
    info!(project_id = %project.id, user_id = %current.id, "Project created");

    Ok((StatusCode::CREATED, Json(project)))
}

/// Renames are copied onto the employees assigned to the project.
///
/// PUT /api/v1/projects/:project_id
pub async fn update_project(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(project_id): Path<Uuid>,
    Json(mut input): Json<ProjectInput>,
) -> Result<Json<Project>, ApiError> {
    current.require(PermissionSection::Projects, PermissionAction::Edit)?;

    input.name = input.name.trim().to_string();
    input.validate()?;

    let repo = ProjectRepository::new(state.pool.clone());
    let before = repo
        .find_by_id(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(PROJECT_NOT_FOUND.to_string()))?;
    let project = repo
        .update(project_id, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound(PROJECT_NOT_FOUND.to_string()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Update, EntityType::Project)
            .on_entity(project.id)
            .with_name(project.name.clone())
            .with_change("name", before.name.as_str(), project.name.as_str())
            .with_change("status", before.status.as_str(), project.status.as_str())
            .build(),
    );
    info!(project_id = %project.id, user_id = %current.id, "Project updated");

    Ok(Json(project))
}

/// DELETE /api/v1/projects/:project_id
pub async fn delete_project(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectDeletion>, ApiError> {
    current.require(PermissionSection::Projects, PermissionAction::Delete)?;

    let detached_employees = ProjectRepository::new(state.pool.clone())
        .delete(project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(PROJECT_NOT_FOUND.to_string()))?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Delete, EntityType::Project)
            .on_entity(project_id)
            .with_detail("detached_employees", detached_employees)
            .build(),
    );
    info!(project_id = %project_id, detached_employees, "Project deleted");

    Ok(Json(ProjectDeletion {
        project_id,
        detached_employees,
    }))
}
