//! Authentication routes: login, token refresh, current user and own
//! password change.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use domain::models::user::ChangeOwnPasswordRequest;
use domain::models::{ActivityAction, EntityType, UserResponse};
use persistence::repositories::{ActivityLogRepository, UserRepository};
use serde::{Deserialize, Serialize};
use shared::jwt::TokenPair;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{client_ip, CurrentUser};
use crate::services::AuthService;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "البريد الإلكتروني غير صالح"))]
    pub email: String,

    #[validate(length(min = 1, message = "كلمة المرور مطلوبة"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "رمز التحديث مطلوب"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let result = AuthService::new(state.pool.clone(), state.jwt.clone())
        .login(
            &request.email.trim().to_lowercase(),
            &request.password,
            client_ip(&headers),
        )
        .await?;

    Ok(Json(LoginResponse {
        user: result.user.into(),
        tokens: result.tokens,
    }))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    request.validate()?;
    let tokens = AuthService::new(state.pool.clone(), state.jwt.clone())
        .refresh(&request.refresh_token)
        .await?;
    Ok(Json(tokens))
}

/// Current user with effective permissions.
///
/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(current.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("المستخدم غير موجود".to_string()))?;
    Ok(Json(user.into()))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<ChangeOwnPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    AuthService::new(state.pool.clone(), state.jwt.clone())
        .change_own_password(current.id, &request.current_password, &request.new_password)
        .await?;

    ActivityLogRepository::new(state.pool.clone()).insert_async(
        current
            .activity(ActivityAction::PasswordChange, EntityType::User)
            .on_entity(current.id)
            .build(),
    );

    Ok(StatusCode::NO_CONTENT)
}
