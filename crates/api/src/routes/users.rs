//! User administration routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::permission::{permission_schema as schema, PermissionSchemaEntry};
use domain::models::user::{CreateUserRequest, SetPasswordRequest, UpdateUserRequest};
use domain::models::{
    ActivityAction, EntityType, PermissionAction, PermissionMatrix, PermissionSection, Role, User,
    UserResponse,
};
use persistence::repositories::{ActivityLogRepository, NewUser, UserRepository};
use shared::password::{check_strength, hash_password};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::AuthService;

const USER_NOT_FOUND: &str = "المستخدم غير موجود";
const LAST_ADMIN_MESSAGE: &str = "لا يمكن إزالة صلاحية آخر مدير نشط في النظام";

/// Rejects updates that would leave the system without an active admin.
fn check_last_admin(
    target: &User,
    request: &UpdateUserRequest,
    other_active_admins: i64,
) -> Result<(), ApiError> {
    let is_active_admin = target.role == Role::Admin && target.is_active;
    let demoted = request.role.map_or(false, |r| r != Role::Admin);
    let deactivated = request.is_active == Some(false);
    if is_active_admin && (demoted || deactivated) && other_active_admins == 0 {
        return Err(ApiError::Conflict(LAST_ADMIN_MESSAGE.to_string()));
    }
    Ok(())
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    current.require(PermissionSection::Users, PermissionAction::View)?;
    let users = UserRepository::new(state.pool.clone()).list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/v1/users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    current.require(PermissionSection::Users, PermissionAction::View)?;
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;
    Ok(Json(user.into()))
}

/// Creates a user with a password set by the administrator.
///
/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    current.require(PermissionSection::Users, PermissionAction::Create)?;
    request.validate()?;
    if request.role == Role::Admin {
        current.require_admin()?;
    }

    check_strength(&request.password)?;
    let password_hash = hash_password(&request.password)?;
    let permissions = request
        .permissions
        .as_ref()
        .map(PermissionMatrix::normalize)
        .unwrap_or_default()
        .to_json();
    let email = request.email.trim().to_lowercase();

    let user = UserRepository::new(state.pool.clone())
        .create(NewUser {
            email: &email,
            password_hash: &password_hash,
            full_name: request.full_name.trim(),
            role: request.role,
            permissions: &permissions,
        })
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::Create, EntityType::User)
            .on_entity(user.id)
            .with_name(user.full_name.clone())
            .with_detail("email", user.email.clone())
            .with_detail("role", user.role.as_str())
            .build(),
    );
    info!(user_id = %user.id, created_by = %current.id, role = %user.role, "User created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Partial update of name, role, permissions and active flag.
///
/// PATCH /api/v1/users/:user_id
pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    current.require(PermissionSection::Users, PermissionAction::Edit)?;
    request.validate()?;

    if request.role.is_some() {
        current.require_admin()?;
    }
    if user_id == current.id && request.is_active == Some(false) {
        return Err(ApiError::validation("لا يمكنك تعطيل حسابك"));
    }

    let repo = UserRepository::new(state.pool.clone());
    let before = repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;
    if before.role == Role::Admin {
        current.require_admin()?;
    }
    check_last_admin(&before, &request, repo.count_other_active_admins(user_id).await?)?;

    let permissions = request
        .permissions
        .as_ref()
        .map(|p| PermissionMatrix::normalize(p).to_json());
    let user = repo
        .update(
            user_id,
            request.full_name.as_deref(),
            request.role,
            permissions.as_ref(),
            request.is_active,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    let mut entry = current
        .activity(ActivityAction::Update, EntityType::User)
        .on_entity(user.id)
        .with_name(user.full_name.clone())
        .with_change("role", before.role.as_str(), user.role.as_str())
        .with_change("is_active", before.is_active, user.is_active);
    if permissions.is_some() {
        entry = entry.with_detail("permissions_updated", true);
    }
    ActivityLogRepository::new(state.pool.clone()).insert_async(entry.build());
    info!(user_id = %user.id, updated_by = %current.id, "User updated");

    Ok(Json(user.into()))
}

/// Replaces another user's password.
///
/// PUT /api/v1/users/:user_id/password
pub async fn set_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    current.require(PermissionSection::Users, PermissionAction::Edit)?;
    request.validate()?;

    let target = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;
    if target.role == Role::Admin && target.id != current.id {
        current.require_admin()?;
    }

    AuthService::new(state.pool.clone(), state.jwt.clone())
        .set_password(user_id, &request.new_password)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::PasswordChange, EntityType::User)
            .on_entity(user_id)
            .with_name(target.full_name)
            .build(),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Sections and actions with Arabic labels.
///
/// GET /api/v1/permissions/schema
pub async fn permission_schema(
    current: CurrentUser,
) -> Result<Json<Vec<PermissionSchemaEntry>>, ApiError> {
    current.require(PermissionSection::Users, PermissionAction::View)?;
    Ok(Json(schema()))
}
