//! Bearer-token authentication extractor.
//!
//! The token only identifies the user. Role, permissions and the active
//! flag are re-read from the database on every request so that an admin's
//! changes take effect immediately.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use domain::models::{
    ActivityAction, EntityType, PermissionAction, PermissionMatrix, PermissionSection, Role, User,
};
use domain::services::ActivityLogBuilder;
use persistence::repositories::UserRepository;
use shared::jwt::extract_user_id;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

pub const FORBIDDEN_MESSAGE: &str = "ليس لديك صلاحية لتنفيذ هذه العملية";

/// The authenticated, active caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub permissions: PermissionMatrix,
    /// Client address from proxy headers, for the activity log.
    pub ip_address: Option<String>,
}

impl CurrentUser {
    pub fn from_user(user: &User, ip_address: Option<String>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            permissions: user.effective_permissions(),
            ip_address,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can(&self, section: PermissionSection, action: PermissionAction) -> bool {
        self.permissions.allows(section, action)
    }

    /// Fails with 403 unless the caller holds `section.action`.
    pub fn require(
        &self,
        section: PermissionSection,
        action: PermissionAction,
    ) -> Result<(), ApiError> {
        if self.can(section, action) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %self.id,
                section = section.key(),
                action = action.as_str(),
                "Permission denied"
            );
            Err(ApiError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
        }
    }

    /// Starts an activity-log entry attributed to this user.
    pub fn activity(&self, action: ActivityAction, entity_type: EntityType) -> ActivityLogBuilder {
        ActivityLogBuilder::user_action(self.id, action, entity_type)
            .with_ip(self.ip_address.clone())
    }
}

/// First hop of `x-forwarded-for`, else `x-real-ip`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("يجب تسجيل الدخول أولاً".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("ترويسة التفويض غير صالحة".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(&parts.headers)?;
        let claims = state.jwt.validate_access_token(token)?;
        let user_id = extract_user_id(&claims)?;

        let user = UserRepository::new(state.pool.clone())
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("المستخدم غير موجود".to_string()))?;

        if !user.is_active {
            return Err(ApiError::Unauthorized("الحساب معطل".to_string()));
        }

        let current = CurrentUser::from_user(&user, client_ip(&parts.headers));
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}
